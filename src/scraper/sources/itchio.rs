use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{element_text, first_attr};
use crate::normalize::{parse_percentage, parse_price, ListingDraft};
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{Discount, GameListing, Platform};

pub const URL: &str = "https://itch.io/games/on-sale";

static GRID: Lazy<Selector> = Lazy::new(|| Selector::parse(".game_grid_widget, .browse_game_grid").expect("invalid grid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.game_cell").expect("invalid cell selector"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(".game_title a, a.title").expect("invalid title selector"));
static THUMB_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.thumb_link, a.game_link").expect("invalid thumb link selector"));
static THUMB_IMG: Lazy<Selector> = Lazy::new(|| Selector::parse(".game_thumb img").expect("invalid thumb selector"));
static THUMB: Lazy<Selector> = Lazy::new(|| Selector::parse(".game_thumb").expect("invalid thumb selector"));
static SALE_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse(".sale_tag").expect("invalid sale tag selector"));
static PRICE: Lazy<Selector> = Lazy::new(|| Selector::parse(".price_value").expect("invalid price selector"));
static GENRE: Lazy<Selector> = Lazy::new(|| Selector::parse(".game_genre").expect("invalid genre selector"));
static PLATFORM: Lazy<Selector> = Lazy::new(|| Selector::parse(".game_platform span").expect("invalid platform selector"));

pub fn parse_html(html: &str, ctx: &ParseContext) -> Result<Vec<GameListing>, ExtractError> {
    let document = Html::parse_document(html);

    if document.select(&GRID).next().is_none() && document.select(&CELL).next().is_none() {
        return Err(ExtractError::Shape("no itch.io game grid".into()));
    }

    let listings = document
        .select(&CELL)
        .filter_map(|cell| parse_cell(cell, ctx))
        .collect();

    Ok(listings)
}

fn parse_cell(cell: ElementRef<'_>, ctx: &ParseContext) -> Option<GameListing> {
    // Only the sale price is shown; the original is derived from the tag
    let percentage = cell.select(&SALE_TAG).next().map(element_text).as_deref().and_then(parse_percentage)?;
    let final_price = cell
        .select(&PRICE)
        .next()
        .map(element_text)
        .as_deref()
        .and_then(parse_price)
        .unwrap_or(0.0);
    let original_price = if percentage < 100 {
        final_price / (1.0 - f64::from(percentage) / 100.0)
    } else {
        0.0
    };
    let discount = Discount::new(
        Some(percentage),
        (original_price * 100.0).round() / 100.0,
        final_price,
    )
    .filter(|d| d.discount_percentage > 0)?;

    let title_link = cell.select(&TITLE_LINK).next();
    let link = title_link
        .and_then(|a| a.value().attr("href"))
        .or_else(|| cell.select(&THUMB_LINK).next().and_then(|a| a.value().attr("href")))
        .map(str::to_string);

    let thumbnails = cell
        .select(&THUMB_IMG)
        .filter_map(|img| first_attr(img, &["data-lazy_src", "src"]))
        .chain(cell.select(&THUMB).filter_map(|t| first_attr(t, &["data-background_image"])))
        .collect();

    let platforms = cell
        .select(&PLATFORM)
        .filter_map(|span| {
            let hint = format!(
                "{} {}",
                span.value().attr("class").unwrap_or_default(),
                span.value().attr("title").unwrap_or_default()
            )
            .to_lowercase();

            if hint.contains("windows") {
                Some(Platform::Windows)
            } else if hint.contains("apple") || hint.contains("macos") {
                Some(Platform::Mac)
            } else if hint.contains("tux") || hint.contains("linux") {
                Some(Platform::Linux)
            } else {
                None
            }
        })
        .collect();

    let draft = ListingDraft {
        title: title_link.map(element_text),
        link,
        thumbnails,
        platforms,
        genre: cell.select(&GENRE).next().map(element_text),
        discount: Some(discount),
        ..Default::default()
    };

    let draft = if discount.is_free() {
        draft.with_estimated_end(ctx.now, ctx.estimated_promo_days)
    } else {
        draft
    };

    draft.build(Store::Itchio, ctx.base())
}
