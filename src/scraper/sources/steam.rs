use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{element_text, first_attr};
use crate::fetch::FetchRequest;
use crate::normalize::{parse_percentage, parse_price, ListingDraft};
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{Discount, GameListing, Platform};

pub const URL: &str = "https://store.steampowered.com/search/";

static RESULTS: Lazy<Selector> = Lazy::new(|| Selector::parse("#search_resultsRows, #search_result_container").expect("invalid results selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("a.search_result_row").expect("invalid row selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(".title").expect("invalid title selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse(".search_capsule img, img").expect("invalid image selector"));
static DISCOUNT_BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse(".search_discount_block").expect("invalid discount block selector"));
static DISCOUNT_PCT: Lazy<Selector> = Lazy::new(|| Selector::parse(".discount_pct, .search_discount span").expect("invalid discount pct selector"));
static ORIGINAL_PRICE: Lazy<Selector> = Lazy::new(|| Selector::parse(".discount_original_price, .search_price strike").expect("invalid original price selector"));
static FINAL_PRICE: Lazy<Selector> = Lazy::new(|| Selector::parse(".discount_final_price").expect("invalid final price selector"));
static PLATFORM: Lazy<Selector> = Lazy::new(|| Selector::parse("span.platform_img").expect("invalid platform selector"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Paid games currently discounted to zero.
    Free,
    /// Any discounted game; full discounts are routed to temporary downstream.
    Discounted,
}

pub fn request(request: FetchRequest, mode: Mode) -> FetchRequest {
    let request = request
        .param("specials", "1")
        .param("cc", "us")
        .param("l", "english")
        .header("Accept-Language", "en-US,en;q=0.9")
        // skips the age gate on mature titles
        .header("Cookie", "birthtime=0; mature_content=1");

    match mode {
        Mode::Free => request.param("maxprice", "free"),
        Mode::Discounted => request,
    }
}

pub fn parse_html(html: &str, ctx: &ParseContext, mode: Mode) -> Result<Vec<GameListing>, ExtractError> {
    let document = Html::parse_document(html);

    if document.select(&RESULTS).next().is_none() {
        return Err(ExtractError::Shape("no steam search results container".into()));
    }

    let listings = document
        .select(&ROW)
        .filter_map(|row| parse_row(row, ctx, mode))
        .collect();

    Ok(listings)
}

fn parse_row(row: ElementRef<'_>, ctx: &ParseContext, mode: Mode) -> Option<GameListing> {
    let discount = discount(row)?;
    let keep = match mode {
        Mode::Free => discount.is_free(),
        Mode::Discounted => discount.discount_percentage > 0,
    };
    if !keep {
        return None;
    }

    // Search links carry tracking parameters
    let link = row
        .value()
        .attr("href")
        .map(|href| href.split('?').next().unwrap_or(href).to_string());

    let thumbnails = row
        .select(&IMAGE)
        .filter_map(|img| {
            first_attr(img, &["srcset", "src"]).map(|v| v.split_whitespace().next().unwrap_or_default().to_string())
        })
        .collect();

    let platforms = row
        .select(&PLATFORM)
        .filter_map(|span| {
            let classes: Vec<&str> = span.value().classes().collect();
            if classes.contains(&"win") {
                Some(Platform::Windows)
            } else if classes.contains(&"mac") {
                Some(Platform::Mac)
            } else if classes.contains(&"linux") {
                Some(Platform::Linux)
            } else {
                None
            }
        })
        .collect();

    let draft = ListingDraft {
        title: row.select(&TITLE).next().map(element_text),
        link,
        thumbnails,
        platforms,
        discount: Some(discount),
        ..Default::default()
    };

    let draft = if discount.is_free() {
        draft.with_estimated_end(ctx.now, ctx.estimated_promo_days)
    } else {
        draft
    };

    draft.build(Store::Steam, ctx.base())
}

/// Prefer the machine-readable attributes on the discount block, falling
/// back to the rendered labels of older layouts.
fn discount(row: ElementRef<'_>) -> Option<Discount> {
    let block = row.select(&DISCOUNT_BLOCK).next();

    let percentage = block
        .and_then(|b| b.value().attr("data-discount"))
        .and_then(parse_percentage)
        .or_else(|| row.select(&DISCOUNT_PCT).next().map(element_text).as_deref().and_then(parse_percentage))?;

    let final_price = block
        .and_then(|b| b.value().attr("data-price-final"))
        .and_then(|cents| cents.trim().parse::<f64>().ok())
        .map(|cents| cents / 100.0)
        .or_else(|| row.select(&FINAL_PRICE).next().map(element_text).as_deref().and_then(parse_price))
        .unwrap_or(0.0);

    let original_price = row
        .select(&ORIGINAL_PRICE)
        .next()
        .map(element_text)
        .as_deref()
        .and_then(parse_price)
        .unwrap_or(0.0);

    Discount::new(Some(percentage), original_price, final_price)
}
