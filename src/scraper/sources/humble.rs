use serde_json::Value;

use super::ensure_json;
use crate::fetch::FetchRequest;
use crate::normalize::{percentage_from_value, price_from_value, ListingDraft};
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{Discount, GameListing, Platform};

pub const URL: &str = "https://www.humblebundle.com/store/api/search";
const STORE_URL: &str = "https://www.humblebundle.com/store/";
const IMAGE_KEYS: [&str; 4] = ["large_capsule", "featured_image_small", "standard_carousel_image", "icon"];

pub fn request(request: FetchRequest) -> FetchRequest {
    request
        .param("sort", "discount")
        .param("filter", "onsale")
        .param("request", "1")
        .param("page", "0")
        .header("Accept", "application/json")
}

/// Humble has published prices both as `{"amount": 9.99, "currency": "USD"}`
/// and as `[9.99, "USD"]`.
fn amount(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Object(money) => money.get("amount").and_then(price_from_value),
        Value::Array(parts) => parts.first().and_then(price_from_value),
        other => price_from_value(other),
    }
}

fn text(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn parse_json(body: &str, ctx: &ParseContext) -> Result<Vec<GameListing>, ExtractError> {
    let document = ensure_json(body)?;
    let Some(Value::Array(results)) = document.get("results") else {
        return Err(ExtractError::Shape("missing results array".into()));
    };

    let listings = results.iter().filter_map(|item| parse_item(item, ctx)).collect();

    Ok(listings)
}

fn parse_item(item: &Value, ctx: &ParseContext) -> Option<GameListing> {
    let original = amount(item.get("full_price"))?;
    let current = amount(item.get("current_price"))?;
    let percentage = item.get("discount_percentage").and_then(percentage_from_value);

    let discount = Discount::new(percentage, original, current).filter(|d| d.discount_percentage > 0)?;

    let platforms = item
        .get("platforms")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|p| match p.to_lowercase().as_str() {
            "windows" => Some(Platform::Windows),
            "mac" => Some(Platform::Mac),
            "linux" => Some(Platform::Linux),
            _ => None,
        })
        .collect();

    let genre = item
        .get("genres")
        .and_then(Value::as_array)
        .and_then(|g| g.first())
        .and_then(Value::as_str)
        .map(str::to_string);

    let draft = ListingDraft {
        title: text(item, "human_name"),
        link: text(item, "human_url").map(|slug| format!("{STORE_URL}{}", slug.trim_start_matches('/'))),
        thumbnails: IMAGE_KEYS.iter().filter_map(|key| text(item, key)).collect(),
        platforms,
        genre,
        discount: Some(discount),
        ..Default::default()
    };

    let draft = if discount.is_free() {
        draft.with_estimated_end(ctx.now, ctx.estimated_promo_days)
    } else {
        draft
    };

    draft.build(Store::Humble, ctx.base())
}
