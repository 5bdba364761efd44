use serde::Deserialize;
use serde_json::Value;

use super::ensure_json;
use crate::normalize::ListingDraft;
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{GameListing, Platform};

pub const URL: &str = "https://www.freetogame.com/api/games";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entry {
    title: Option<String>,
    game_url: Option<String>,
    freetogame_profile_url: Option<String>,
    thumbnail: Option<String>,
    genre: Option<String>,
    platform: Option<String>,
}

/// The catalogue is a flat array of free-to-play games. Listings carry no
/// store of their own and are bucketed by genre downstream.
pub fn parse_json(body: &str, ctx: &ParseContext) -> Result<Vec<GameListing>, ExtractError> {
    let Value::Array(entries) = ensure_json(body)? else {
        return Err(ExtractError::Shape("expected a json array of games".into()));
    };

    let listings = entries
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<Entry>(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed freetogame entry");
                None
            }
        })
        .filter_map(|entry| {
            ListingDraft {
                title: entry.title,
                link: entry.game_url.or(entry.freetogame_profile_url),
                thumbnails: entry.thumbnail.into_iter().collect(),
                platforms: entry.platform.as_deref().map(platforms).unwrap_or_default(),
                genre: entry.genre,
                ..Default::default()
            }
            .build(Store::Unknown, ctx.base())
        })
        .collect();

    Ok(listings)
}

/// `"PC (Windows)"`, `"Web Browser"` or both, comma separated.
fn platforms(raw: &str) -> std::collections::BTreeSet<Platform> {
    let raw = raw.to_lowercase();
    let mut set = std::collections::BTreeSet::new();

    if raw.contains("windows") {
        set.insert(Platform::Windows);
    }
    if raw.contains("browser") {
        set.extend([Platform::Windows, Platform::Mac, Platform::Linux]);
    }

    set
}
