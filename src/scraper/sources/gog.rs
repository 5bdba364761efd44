use serde::Deserialize;
use serde_json::Value;

use super::ensure_json;
use crate::fetch::FetchRequest;
use crate::normalize::{percentage_from_value, price_from_value, ListingDraft};
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{Discount, GameListing, Platform};

pub const URL: &str = "https://catalog.gog.com/v1/catalog";
const GAME_URL: &str = "https://www.gog.com/en/game/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Zero final price: free-to-keep titles and giveaways.
    Free,
    /// Anything with a discount.
    Discounted,
}

pub fn request(request: FetchRequest, mode: Mode) -> FetchRequest {
    let request = request
        .param("limit", "48")
        .param("productType", "in:game,pack")
        .param("countryCode", "US")
        .param("locale", "en-US")
        .param("currencyCode", "USD")
        .header("Accept", "application/json");

    match mode {
        Mode::Free => request.param("price", "between:0,0").param("order", "desc:trending"),
        Mode::Discounted => request.param("discounted", "eq:true").param("order", "desc:discount"),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Product {
    title: Option<String>,
    slug: Option<String>,
    store_link: Option<String>,
    cover_horizontal: Option<String>,
    cover_vertical: Option<String>,
    genres: Vec<Genre>,
    operating_systems: Vec<String>,
    price: Option<Price>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Genre {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Price {
    #[serde(rename = "final")]
    final_price: Value,
    base: Value,
    discount: Value,
    final_money: Option<Money>,
    base_money: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Money {
    amount: Value,
}

impl Price {
    fn amounts(&self) -> (Option<f64>, Option<f64>) {
        let money = |m: &Option<Money>| m.as_ref().and_then(|m| price_from_value(&m.amount));
        let base = money(&self.base_money).or_else(|| price_from_value(&self.base));
        let final_price = money(&self.final_money).or_else(|| price_from_value(&self.final_price));
        (base, final_price)
    }
}

pub fn parse_json(body: &str, ctx: &ParseContext, mode: Mode) -> Result<Vec<GameListing>, ExtractError> {
    let document = ensure_json(body)?;
    let Some(Value::Array(raw)) = document.get("products") else {
        return Err(ExtractError::Shape("missing products array".into()));
    };

    let listings = raw
        .iter()
        .filter_map(|p| serde_json::from_value::<Product>(p.clone()).ok())
        .filter_map(|product| {
            let price = product.price.as_ref()?;
            let (base, final_price) = price.amounts();
            let final_price = final_price?;
            let base = base.unwrap_or(final_price);
            let percentage = percentage_from_value(&price.discount);

            let discount = Discount::new(percentage, base, final_price).filter(|d| d.discount_percentage > 0);

            let keep = match mode {
                Mode::Free => final_price == 0.0,
                Mode::Discounted => discount.is_some(),
            };
            if !keep {
                return None;
            }

            let link = product
                .store_link
                .clone()
                .or_else(|| product.slug.as_ref().map(|slug| format!("{GAME_URL}{slug}")));

            let draft = ListingDraft {
                title: product.title.clone(),
                link,
                thumbnails: [&product.cover_horizontal, &product.cover_vertical]
                    .into_iter()
                    .flatten()
                    .cloned()
                    .collect(),
                platforms: product.operating_systems.iter().filter_map(|os| platform(os)).collect(),
                genre: product.genres.iter().find_map(|g| g.name.clone()),
                discount,
                ..Default::default()
            };

            // A zero price on a paid game is a giveaway with no published end
            let draft = if discount.is_some_and(|d| d.is_free()) {
                draft.with_estimated_end(ctx.now, ctx.estimated_promo_days)
            } else {
                draft
            };

            draft.build(Store::Gog, ctx.base())
        })
        .collect();

    Ok(listings)
}

fn platform(os: &str) -> Option<Platform> {
    match os.to_lowercase().as_str() {
        "windows" => Some(Platform::Windows),
        "osx" | "mac" | "macos" => Some(Platform::Mac),
        "linux" => Some(Platform::Linux),
        _ => None,
    }
}
