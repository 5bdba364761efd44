use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::{element_text, first_attr};
use crate::normalize::{parse_price, ListingDraft};
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{GameListing, Platform};

pub const URL: &str = "https://store.playstation.com/en-us/search/free%20to%20play";

static TILE_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="/concept/"], a[href*="/product/"]"#).expect("invalid tile link selector")
});
static NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r##"[data-qa$="#product-name"]"##).expect("invalid name selector"));
static PRICE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r##"[data-qa$="#price#display-price"]"##).expect("invalid price selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("invalid image selector"));

/// Free-to-play titles from a PlayStation Store grid. A tile is kept only
/// when it advertises a zero price.
pub fn parse_html(html: &str, ctx: &ParseContext) -> Result<Vec<GameListing>, ExtractError> {
    let document = Html::parse_document(html);

    let listings = document
        .select(&TILE_LINK)
        .filter_map(|tile| parse_tile(tile, ctx))
        .collect();

    Ok(listings)
}

fn parse_tile(tile: ElementRef<'_>, ctx: &ParseContext) -> Option<GameListing> {
    // Tiles carry a JSON blob used for analytics that repeats name and price
    let telemetry: Option<Value> = tile
        .value()
        .attr("data-telemetry-meta")
        .and_then(|raw| serde_json::from_str(raw).ok());
    let telemetry_field =
        |name: &str| telemetry.as_ref().and_then(|t| t.get(name)).and_then(Value::as_str).map(str::to_string);

    let price = tile
        .select(&PRICE)
        .next()
        .map(element_text)
        .or_else(|| telemetry_field("price"))
        .as_deref()
        .and_then(parse_price);
    if price != Some(0.0) {
        return None;
    }

    let title = tile
        .select(&NAME)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .or_else(|| telemetry_field("name"))
        .or_else(|| tile.select(&IMAGE).find_map(|img| first_attr(img, &["alt"])));

    let thumbnails = tile
        .select(&IMAGE)
        .filter_map(|img| first_attr(img, &["src", "data-src"]))
        .filter(|src| !src.starts_with("data:"))
        .map(|src| src.split('?').next().unwrap_or(&src).to_string())
        .collect();

    ListingDraft {
        title,
        link: tile.value().attr("href").map(str::to_string),
        thumbnails,
        platforms: [Platform::Playstation].into_iter().collect(),
        ..Default::default()
    }
    .build(Store::Playstation, ctx.base())
}
