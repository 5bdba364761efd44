use std::fmt;

use scraper::ElementRef;

use crate::fetch::FetchRequest;
use crate::stores::Store;
use crate::types::{Category, GameListing};

use super::{ExtractError, ParseContext};

pub mod cheapshark;
pub mod epic;
pub mod freetogame;
pub mod gog;
pub mod humble;
pub mod itchio;
pub mod playstation;
pub mod steam;
pub mod xbox;

#[cfg(test)]
mod tests;

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// One upstream listing page, parsed by one extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    FreeToGame,
    EpicPermanent,
    EpicTemporary,
    SteamFree,
    SteamDiscounted,
    GogFree,
    GogDiscounted,
    Playstation,
    Xbox,
    Humble,
    Itchio,
    CheapShark,
}

/// Where a source's listings are bucketed when they carry no discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Home {
    /// By the listing's genre (catalogue sites not tied to a store).
    Genre,
    /// By the listing's store.
    Store(Store),
}

impl Source {
    /// Aggregation order. Direct store pages come before the CheapShark
    /// mirror so their copy of a game wins deduplication.
    pub const ALL: [Source; 12] = [
        Source::FreeToGame,
        Source::EpicPermanent,
        Source::EpicTemporary,
        Source::SteamFree,
        Source::SteamDiscounted,
        Source::GogFree,
        Source::GogDiscounted,
        Source::Playstation,
        Source::Xbox,
        Source::Humble,
        Source::Itchio,
        Source::CheapShark,
    ];

    /// Config key under `sources.*`.
    pub fn name(&self) -> &'static str {
        match self {
            Source::FreeToGame => "freetogame",
            Source::EpicPermanent => "epic_permanent",
            Source::EpicTemporary => "epic_temporary",
            Source::SteamFree => "steam_free",
            Source::SteamDiscounted => "steam_discounted",
            Source::GogFree => "gog_free",
            Source::GogDiscounted => "gog_discounted",
            Source::Playstation => "playstation",
            Source::Xbox => "xbox",
            Source::Humble => "humble",
            Source::Itchio => "itchio",
            Source::CheapShark => "cheapshark",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn category(&self) -> Category {
        match self {
            Source::FreeToGame
            | Source::EpicPermanent
            | Source::GogFree
            | Source::Playstation
            | Source::Xbox => Category::Permanent,
            Source::EpicTemporary | Source::SteamFree => Category::Temporary,
            Source::SteamDiscounted
            | Source::GogDiscounted
            | Source::Humble
            | Source::Itchio
            | Source::CheapShark => Category::Sale,
        }
    }

    pub fn home(&self) -> Home {
        match self {
            Source::FreeToGame => Home::Genre,
            Source::EpicPermanent | Source::EpicTemporary => Home::Store(Store::Epic),
            Source::SteamFree | Source::SteamDiscounted => Home::Store(Store::Steam),
            Source::GogFree | Source::GogDiscounted => Home::Store(Store::Gog),
            Source::Playstation => Home::Store(Store::Playstation),
            Source::Xbox => Home::Store(Store::Xbox),
            Source::Humble => Home::Store(Store::Humble),
            Source::Itchio => Home::Store(Store::Itchio),
            // Deals from unmapped stores end up here
            Source::CheapShark => Home::Store(Store::Unknown),
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Source::FreeToGame => freetogame::URL,
            Source::EpicPermanent | Source::EpicTemporary => epic::URL,
            Source::SteamFree | Source::SteamDiscounted => steam::URL,
            Source::GogFree | Source::GogDiscounted => gog::URL,
            Source::Playstation => playstation::URL,
            Source::Xbox => xbox::URL,
            Source::Humble => humble::URL,
            Source::Itchio => itchio::URL,
            Source::CheapShark => cheapshark::URL,
        }
    }

    /// Request for `url` with the query parameters the source needs.
    pub fn request(&self, url: &str) -> FetchRequest {
        let request = FetchRequest::get(url);
        match self {
            Source::FreeToGame => request.header("Accept", "application/json"),
            Source::CheapShark => cheapshark::request(request),
            Source::EpicPermanent | Source::EpicTemporary => epic::request(request),
            Source::SteamFree => steam::request(request, steam::Mode::Free),
            Source::SteamDiscounted => steam::request(request, steam::Mode::Discounted),
            Source::GogFree => gog::request(request, gog::Mode::Free),
            Source::GogDiscounted => gog::request(request, gog::Mode::Discounted),
            Source::Humble => humble::request(request),
            Source::Playstation | Source::Xbox | Source::Itchio => request
                .header("Accept", BROWSER_ACCEPT)
                .header("Accept-Language", "en-US,en;q=0.9"),
        }
    }

    pub fn parse(&self, body: &str, ctx: &ParseContext) -> Result<Vec<GameListing>, ExtractError> {
        match self {
            Source::FreeToGame => freetogame::parse_json(body, ctx),
            Source::EpicPermanent => epic::parse_json(body, ctx, epic::Mode::Permanent),
            Source::EpicTemporary => epic::parse_json(body, ctx, epic::Mode::Temporary),
            Source::SteamFree => steam::parse_html(body, ctx, steam::Mode::Free),
            Source::SteamDiscounted => steam::parse_html(body, ctx, steam::Mode::Discounted),
            Source::GogFree => gog::parse_json(body, ctx, gog::Mode::Free),
            Source::GogDiscounted => gog::parse_json(body, ctx, gog::Mode::Discounted),
            Source::Playstation => playstation::parse_html(body, ctx),
            Source::Xbox => xbox::parse_html(body, ctx),
            Source::Humble => humble::parse_json(body, ctx),
            Source::Itchio => itchio::parse_html(body, ctx),
            Source::CheapShark => cheapshark::parse_json(body, ctx),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collected, whitespace-normalized text of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    crate::normalize::clean_text(&element.text().collect::<String>())
}

/// First non-empty attribute among `names`.
pub(crate) fn first_attr(element: ElementRef<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reject bodies that are obviously not the JSON an API returns, such as
/// an HTML error page served with a 200.
pub(crate) fn ensure_json(body: &str) -> Result<serde_json::Value, ExtractError> {
    if body.trim().is_empty() {
        return Err(ExtractError::Shape("empty body".into()));
    }
    Ok(serde_json::from_str(body)?)
}
