use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{element_text, first_attr};
use crate::normalize::{parse_price, ListingDraft};
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{GameListing, Platform};

pub const URL: &str = "https://www.xbox.com/en-US/games/free-to-play";

static CARD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="/games/store/"], .m-product-placement-item a[href]"#).expect("invalid card selector")
});
static TITLE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="ProductCard-module__title"], h3, .c-subheading-6"#).expect("invalid title selector")
});
static PRICE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="Price-module__"], [itemprop="price"]"#).expect("invalid price selector")
});
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("invalid image selector"));

/// Cards on the Xbox free-to-play page. Cards without a price label are
/// free by virtue of the page; cards priced above zero are skipped.
pub fn parse_html(html: &str, ctx: &ParseContext) -> Result<Vec<GameListing>, ExtractError> {
    let document = Html::parse_document(html);

    let listings = document
        .select(&CARD)
        .filter_map(|card| parse_card(card, ctx))
        .collect();

    Ok(listings)
}

fn parse_card(card: ElementRef<'_>, ctx: &ParseContext) -> Option<GameListing> {
    let price = card.select(&PRICE).next().map(element_text);
    if price.as_deref().and_then(parse_price).is_some_and(|p| p > 0.0) {
        return None;
    }

    let title = card
        .select(&TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .or_else(|| first_attr(card, &["aria-label", "title"]))
        .or_else(|| card.select(&IMAGE).find_map(|img| first_attr(img, &["alt"])));

    ListingDraft {
        title,
        link: card.value().attr("href").map(str::to_string),
        thumbnails: card
            .select(&IMAGE)
            .filter_map(|img| first_attr(img, &["src", "data-src"]))
            .collect(),
        platforms: [Platform::Xbox].into_iter().collect(),
        ..Default::default()
    }
    .build(Store::Xbox, ctx.base())
}
