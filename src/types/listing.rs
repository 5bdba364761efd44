use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stores::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Mac,
    Linux,
    Playstation,
    Xbox,
}

impl Platform {
    /// Best guess when the upstream does not say which platforms a game runs on.
    pub fn default_for(store: Store) -> Self {
        match store {
            Store::Playstation => Self::Playstation,
            Store::Xbox => Self::Xbox,
            _ => Self::Windows,
        }
    }
}

/// Price reduction attached to a listing. Prices are in the store's own currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub discount_percentage: u8,
    pub original_price: f64,
    pub final_price: f64,
}

impl Discount {
    /// Build a discount from the values a store publishes. A missing or zero
    /// percentage is derived from the two prices. 100% is reserved for a
    /// zero final price.
    pub fn new(percentage: Option<u8>, original_price: f64, final_price: f64) -> Option<Self> {
        if !original_price.is_finite() || !final_price.is_finite() || original_price < 0.0 || final_price < 0.0 {
            return None;
        }

        let percentage = match percentage {
            Some(p) if p > 0 => p.min(100),
            _ if original_price > 0.0 => {
                let ratio = 1.0 - final_price / original_price;
                (ratio * 100.0).round().clamp(0.0, 100.0) as u8
            }
            _ => 0,
        };

        // A rounded-up 99.5% deal still costs money
        let percentage = if percentage == 100 && final_price > 0.0 { 99 } else { percentage };

        Some(Self {
            discount_percentage: percentage,
            original_price,
            final_price,
        })
    }

    pub fn is_free(&self) -> bool {
        self.discount_percentage >= 100
    }

    /// A real partial reduction: strictly between 0% and 100%.
    pub fn is_partial(&self) -> bool {
        self.discount_percentage > 0 && self.discount_percentage < 100
    }
}

/// A normalized game listing. Built fresh on every extractor run; see
/// [`crate::normalize::ListingDraft`] for the only way to construct one from
/// upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameListing {
    pub title: String,
    pub link: String,
    pub thumbnail: String,
    pub store: Store,
    #[serde(default)]
    pub platforms: BTreeSet<Platform>,
    pub genre: String,
    /// Authoritative when published by the store, otherwise an estimate
    /// flagged by `end_date_estimated`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub end_date_estimated: bool,
    #[serde(default, flatten, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
}
