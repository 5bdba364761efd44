#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Epic,
    Steam,
    Gog,
    Playstation,
    Xbox,
    Humble,
    Itchio,
    Unknown,
}

/// Which half of a free-game category a store's listings land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformGroup {
    Pc,
    Console,
}

impl Store {
    pub const ALL: [Store; 8] = [
        Self::Epic,
        Self::Steam,
        Self::Gog,
        Self::Playstation,
        Self::Xbox,
        Self::Humble,
        Self::Itchio,
        Self::Unknown,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::Steam => "steam",
            Self::Gog => "gog",
            Self::Playstation => "playstation",
            Self::Xbox => "xbox",
            Self::Humble => "humble",
            Self::Itchio => "itchio",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|store| store.slug() == s)
    }

    /// Key of the store's bucket inside an aggregate category.
    pub fn bucket_key(&self) -> &'static str {
        match self {
            Self::Epic => "epic_games",
            Self::Unknown => "other",
            other => other.slug(),
        }
    }

    pub fn platform_group(&self) -> PlatformGroup {
        match self {
            Self::Playstation | Self::Xbox => PlatformGroup::Console,
            _ => PlatformGroup::Pc,
        }
    }

    /// Map a CheapShark `storeID` to the storefront it refers to.
    pub fn from_cheapshark_id(id: &str) -> Self {
        match id.trim() {
            "1" => Self::Steam,
            "7" => Self::Gog,
            "11" => Self::Humble,
            "25" => Self::Epic,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
