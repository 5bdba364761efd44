use serde::Deserialize;
use serde_json::Value;

use super::ensure_json;
use crate::fetch::FetchRequest;
use crate::normalize::{percentage_from_value, price_from_value, ListingDraft};
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{Discount, GameListing};

pub const URL: &str = "https://www.cheapshark.com/api/1.0/deals";
const REDIRECT_URL: &str = "https://www.cheapshark.com/redirect?dealID=";
const STEAM_APP_URL: &str = "https://store.steampowered.com/app/";

pub fn request(request: FetchRequest) -> FetchRequest {
    request
        .param("onSale", "1")
        .param("sortBy", "Savings")
        .param("pageSize", "60")
        .param("storeID", "1,7,11,25")
        .header("Accept", "application/json")
}

/// CheapShark sends numbers as strings (`"salePrice": "4.99"`).
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Deal {
    title: Option<String>,
    #[serde(rename = "dealID")]
    deal_id: Option<String>,
    #[serde(rename = "storeID")]
    store_id: Value,
    #[serde(rename = "steamAppID")]
    steam_app_id: Option<String>,
    sale_price: Value,
    normal_price: Value,
    savings: Value,
    thumb: Option<String>,
}

pub fn parse_json(body: &str, ctx: &ParseContext) -> Result<Vec<GameListing>, ExtractError> {
    let Value::Array(deals) = ensure_json(body)? else {
        return Err(ExtractError::Shape("expected a json array of deals".into()));
    };

    let listings = deals
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<Deal>(raw).ok())
        .filter_map(|deal| parse_deal(deal, ctx))
        .collect();

    Ok(listings)
}

fn parse_deal(deal: Deal, ctx: &ParseContext) -> Option<GameListing> {
    let original = price_from_value(&deal.normal_price)?;
    let current = price_from_value(&deal.sale_price)?;
    let discount = Discount::new(percentage_from_value(&deal.savings), original, current)
        .filter(|d| d.discount_percentage > 0)?;

    let store = match &deal.store_id {
        Value::String(id) => Store::from_cheapshark_id(id),
        Value::Number(id) => Store::from_cheapshark_id(&id.to_string()),
        _ => Store::Unknown,
    };

    let steam_app = deal
        .steam_app_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != "0");

    // Link straight to Steam when possible so the deal collapses with the
    // same game scraped from the store itself.
    let link = match (store, steam_app) {
        (Store::Steam, Some(app)) => Some(format!("{STEAM_APP_URL}{app}")),
        _ => deal.deal_id.as_deref().map(|id| format!("{REDIRECT_URL}{id}")),
    };

    let mut thumbnails = Vec::new();
    if let Some(app) = steam_app {
        thumbnails.push(format!("https://cdn.cloudflare.steamstatic.com/steam/apps/{app}/header.jpg"));
    }
    thumbnails.extend(deal.thumb.clone());

    let draft = ListingDraft {
        title: deal.title.clone(),
        link,
        thumbnails,
        discount: Some(discount),
        ..Default::default()
    };

    let draft = if discount.is_free() {
        draft.with_estimated_end(ctx.now, ctx.estimated_promo_days)
    } else {
        draft
    };

    draft.build(store, ctx.base())
}
