use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::GameListing;
use crate::stores::PlatformGroup;

/// Listings grouped by bucket key: a store key (`epic_games`, `steam`, ...)
/// or, for catalogues that do not name a store, a genre.
pub type Buckets = BTreeMap<String, Vec<GameListing>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Permanent,
    Temporary,
    Sale,
}

impl Category {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Temporary => "temporary",
            Self::Sale => "sale",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        match s {
            "permanent" => Some(Self::Permanent),
            "temporary" => Some(Self::Temporary),
            "sale" => Some(Self::Sale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformBuckets {
    #[serde(default)]
    pub pc: Buckets,
    #[serde(default)]
    pub console: Buckets,
}

impl PlatformBuckets {
    pub fn group(&self, group: PlatformGroup) -> &Buckets {
        match group {
            PlatformGroup::Pc => &self.pc,
            PlatformGroup::Console => &self.console,
        }
    }

    pub fn group_mut(&mut self, group: PlatformGroup) -> &mut Buckets {
        match group {
            PlatformGroup::Pc => &mut self.pc,
            PlatformGroup::Console => &mut self.console,
        }
    }

    pub fn listing_count(&self) -> usize {
        count(&self.pc) + count(&self.console)
    }
}

/// `{permanent: {pc, console}, temporary: {pc, console}, sale: {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(default)]
    pub permanent: PlatformBuckets,
    #[serde(default)]
    pub temporary: PlatformBuckets,
    #[serde(default)]
    pub sale: Buckets,
}

impl AggregateResult {
    pub fn listing_count(&self) -> usize {
        self.permanent.listing_count() + self.temporary.listing_count() + count(&self.sale)
    }

    pub fn is_empty(&self) -> bool {
        self.listing_count() == 0
    }

    /// The buckets a (category, platform) pair addresses. Sale is not split
    /// by platform, so `group` is ignored for it.
    pub fn buckets(&self, category: Category, group: PlatformGroup) -> &Buckets {
        match category {
            Category::Permanent => self.permanent.group(group),
            Category::Temporary => self.temporary.group(group),
            Category::Sale => &self.sale,
        }
    }

    pub fn buckets_mut(&mut self, category: Category, group: PlatformGroup) -> &mut Buckets {
        match category {
            Category::Permanent => self.permanent.group_mut(group),
            Category::Temporary => self.temporary.group_mut(group),
            Category::Sale => &mut self.sale,
        }
    }
}

fn count(buckets: &Buckets) -> usize {
    buckets.values().map(Vec::len).sum()
}
