//! Epic Games Store promotions feed.
//!
//! One document serves both the permanent and the temporary extractor, so
//! they share a cache entry. Epic encodes a giveaway as a promotional offer
//! whose `discountPercentage` is 0, meaning the price is multiplied by zero.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::ensure_json;
use crate::fetch::FetchRequest;
use crate::normalize::ListingDraft;
use crate::scraper::{ExtractError, ParseContext};
use crate::stores::Store;
use crate::types::{Discount, GameListing};

pub const URL: &str = "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions";
const PRODUCT_URL: &str = "https://store.epicgames.com/en-US/p/";
const UPCOMING_SUFFIX: &str = " (Upcoming)";
const IMAGE_PREFERENCE: [&str; 4] = ["OfferImageWide", "Thumbnail", "DieselStoreFrontWide", "OfferImageTall"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Always-free titles: zero price, no running promotion.
    Permanent,
    /// Titles free for a limited time, or announced as such.
    Temporary,
}

pub fn request(request: FetchRequest) -> FetchRequest {
    request
        .param("locale", "en-US")
        .param("country", "US")
        .param("allowCountries", "US")
        .header("Accept", "application/json")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Element {
    title: Option<String>,
    product_slug: Option<String>,
    url_slug: Option<String>,
    catalog_ns: Option<CatalogNs>,
    offer_mappings: Option<Vec<Mapping>>,
    key_images: Option<Vec<KeyImage>>,
    price: Option<Price>,
    promotions: Option<Promotions>,
    offer_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogNs {
    mappings: Option<Vec<Mapping>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Mapping {
    page_slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KeyImage {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Price {
    total_price: Option<TotalPrice>,
}

/// Amounts are in cents.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TotalPrice {
    original_price: Option<f64>,
    discount_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Promotions {
    promotional_offers: Option<Vec<OfferGroup>>,
    upcoming_promotional_offers: Option<Vec<OfferGroup>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OfferGroup {
    promotional_offers: Option<Vec<Offer>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Offer {
    end_date: Option<String>,
    discount_setting: Option<DiscountSetting>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DiscountSetting {
    discount_percentage: Option<f64>,
}

impl Offer {
    fn is_giveaway(&self) -> bool {
        self.discount_setting
            .as_ref()
            .and_then(|d| d.discount_percentage)
            .is_some_and(|p| p == 0.0)
    }

    fn end(&self) -> Option<DateTime<Utc>> {
        parse_date(self.end_date.as_deref()?)
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).ok().map(|d| d.with_timezone(&Utc))
}

fn offers(groups: Option<&Vec<OfferGroup>>) -> impl Iterator<Item = &Offer> {
    groups
        .into_iter()
        .flatten()
        .flat_map(|g| g.promotional_offers.iter().flatten())
}

impl Element {
    /// Store page slug: `productSlug`, else the first catalog page mapping,
    /// else the first offer mapping. A trailing `/home` is dropped.
    fn slug(&self) -> Option<String> {
        let usable = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "[]")
                .map(str::to_string)
        };

        let slug = usable(&self.product_slug)
            .or_else(|| {
                self.catalog_ns
                    .as_ref()
                    .and_then(|ns| ns.mappings.as_ref())
                    .and_then(|m| m.iter().find_map(|m| usable(&m.page_slug)))
            })
            .or_else(|| {
                self.offer_mappings
                    .as_ref()
                    .and_then(|m| m.iter().find_map(|m| usable(&m.page_slug)))
            })
            .or_else(|| usable(&self.url_slug).filter(|_| self.offer_type.as_deref() != Some("OTHERS")))?;

        let slug = slug.strip_suffix("/home").unwrap_or(&slug).trim_matches('/').to_string();
        (!slug.is_empty()).then_some(slug)
    }

    fn thumbnails(&self) -> Vec<String> {
        let images = self.key_images.as_deref().unwrap_or_default();
        let preferred = IMAGE_PREFERENCE
            .iter()
            .filter_map(|kind| images.iter().find(|i| i.kind.as_deref() == Some(*kind)));

        preferred
            .chain(images.iter())
            .filter_map(|i| i.url.clone())
            .collect()
    }

    fn original_price(&self) -> f64 {
        self.total_price()
            .and_then(|p| p.original_price)
            .map(|cents| cents / 100.0)
            .unwrap_or(0.0)
    }

    fn total_price(&self) -> Option<&TotalPrice> {
        self.price.as_ref().and_then(|p| p.total_price.as_ref())
    }

    fn current_offers(&self) -> impl Iterator<Item = &Offer> {
        offers(self.promotions.as_ref().and_then(|p| p.promotional_offers.as_ref()))
    }

    fn upcoming_offers(&self) -> impl Iterator<Item = &Offer> {
        offers(self.promotions.as_ref().and_then(|p| p.upcoming_promotional_offers.as_ref()))
    }

    fn is_permanently_free(&self) -> bool {
        let zero_price = self
            .total_price()
            .is_some_and(|p| p.original_price == Some(0.0) && p.discount_price == Some(0.0));
        zero_price && self.current_offers().next().is_none()
    }

    fn draft(&self) -> ListingDraft {
        ListingDraft {
            title: self.title.clone(),
            link: self.slug().map(|slug| format!("{PRODUCT_URL}{slug}")),
            thumbnails: self.thumbnails(),
            ..Default::default()
        }
    }
}

pub fn parse_json(body: &str, ctx: &ParseContext, mode: Mode) -> Result<Vec<GameListing>, ExtractError> {
    let document = ensure_json(body)?;
    let Some(Value::Array(raw)) = document.pointer("/data/Catalog/searchStore/elements") else {
        return Err(ExtractError::Shape("missing data.Catalog.searchStore.elements".into()));
    };

    let elements: Vec<Element> = raw
        .iter()
        .filter_map(|e| match serde_json::from_value::<Element>(e.clone()) {
            Ok(element) => Some(element),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed epic element");
                None
            }
        })
        .collect();

    let listings = match mode {
        Mode::Permanent => elements
            .iter()
            .filter(|e| e.is_permanently_free())
            .filter_map(|e| e.draft().build(Store::Epic, ctx.base()))
            .collect(),
        Mode::Temporary => temporary(&elements, ctx),
    };

    Ok(listings)
}

fn temporary(elements: &[Element], ctx: &ParseContext) -> Vec<GameListing> {
    let current: Vec<GameListing> = elements
        .iter()
        .filter_map(|e| {
            let offer = e.current_offers().find(|o| o.is_giveaway())?;
            let mut draft = e.draft();
            draft.end_date = offer.end();
            draft.discount = Discount::new(Some(100), e.original_price(), 0.0);
            draft.build(Store::Epic, ctx.base())
        })
        .collect();

    if !current.is_empty() || !ctx.include_upcoming {
        return current;
    }

    // Between two giveaways the feed only announces the next one.
    elements
        .iter()
        .filter_map(|e| {
            let offer = e.upcoming_offers().find(|o| o.is_giveaway())?;
            let mut draft = e.draft();
            draft.title = draft.title.map(|t| format!("{}{UPCOMING_SUFFIX}", t.trim()));
            draft.end_date = offer.end();
            draft.discount = Discount::new(Some(100), e.original_price(), 0.0);
            draft.build(Store::Epic, ctx.base())
        })
        .collect()
}
