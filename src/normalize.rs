//! Shared mapping from heterogeneous store fields onto [`GameListing`].
//!
//! Every extractor fills a [`ListingDraft`] with whatever the upstream gave it
//! and calls [`ListingDraft::build`]. Drafts without a usable title or link
//! are rejected there, so no listing ever leaves the pipeline with an empty
//! title or a malformed link.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde_json::Value;

use crate::stores::Store;
use crate::types::{Discount, GameListing, Platform};

pub const PLACEHOLDER_THUMBNAIL: &str = "https://via.placeholder.com/460x215?text=No+Image";
pub const DEFAULT_GENRE: &str = "other";

static PRICE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.,]").expect("invalid price regex"));
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("invalid percent regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Image candidates in order of preference.
    pub thumbnails: Vec<String>,
    pub platforms: BTreeSet<Platform>,
    pub genre: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub end_date_estimated: bool,
    pub discount: Option<Discount>,
}

impl ListingDraft {
    /// Mark the listing as expiring `days` after `now`, for stores that do not
    /// publish an end date.
    pub fn with_estimated_end(mut self, now: DateTime<Utc>, days: i64) -> Self {
        self.end_date = Some(estimate_end_date(now, days));
        self.end_date_estimated = true;
        self
    }

    /// Validate and normalize into a listing. Relative links and images are
    /// resolved against `base`. Returns `None` when title or link is unusable.
    pub fn build(self, store: Store, base: Option<&Url>) -> Option<GameListing> {
        let title = self.title.as_deref().map(clean_text).unwrap_or_default();
        if title.is_empty() {
            tracing::debug!(%store, "skipping listing without title");
            return None;
        }

        let Some(link) = self.link.as_deref().and_then(|l| resolve_url(l, base)) else {
            tracing::debug!(%store, title = %title, "skipping listing without a valid link");
            return None;
        };

        let thumbnail = resolve_thumbnail(self.thumbnails.iter().map(String::as_str), base);

        let mut platforms = self.platforms;
        if platforms.is_empty() {
            platforms.insert(Platform::default_for(store));
        }

        Some(GameListing {
            title,
            link,
            thumbnail,
            store,
            platforms,
            genre: normalize_genre(self.genre.as_deref()),
            end_date: self.end_date,
            end_date_estimated: self.end_date.is_some() && self.end_date_estimated,
            discount: self.discount,
        })
    }
}

/// Trim and collapse inner whitespace, as scraped text is full of newlines.
pub fn clean_text(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

pub fn normalize_genre(genre: Option<&str>) -> String {
    let genre = genre.map(clean_text).unwrap_or_default().to_lowercase();
    if genre.is_empty() {
        DEFAULT_GENRE.to_string()
    } else {
        genre
    }
}

/// Resolve a candidate into an absolute http(s) URL.
pub fn resolve_url(candidate: &str, base: Option<&Url>) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    // Absolute links are kept verbatim; only resolved ones are re-serialized.
    let (parsed, text) = if let Some(rest) = candidate.strip_prefix("//") {
        let text = format!("https://{rest}");
        (Url::parse(&text).ok()?, text)
    } else {
        match Url::parse(candidate) {
            Ok(url) => (url, candidate.to_string()),
            Err(_) => {
                let url = base?.join(candidate).ok()?;
                let text = url.to_string();
                (url, text)
            }
        }
    };

    let web = matches!(parsed.scheme(), "http" | "https");
    if web && parsed.host_str().is_some_and(|h| !h.is_empty()) {
        Some(text)
    } else {
        None
    }
}

/// First candidate that resolves to a URL, or the placeholder image.
pub fn resolve_thumbnail<'a>(candidates: impl IntoIterator<Item = &'a str>, base: Option<&Url>) -> String {
    candidates
        .into_iter()
        .find_map(|c| resolve_url(c, base))
        .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string())
}

/// Parse store-formatted prices: `"$19.99"`, `"19,99€"`, `"1.299,00"`, `"Free"`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let lowered = raw.trim().to_lowercase();
    if lowered.starts_with("free") || lowered == "included" {
        return Some(0.0);
    }

    let digits = PRICE_CHARS.replace_all(&lowered, "");
    let digits = digits.trim_matches(|c: char| c == '.' || c == ',');
    if digits.is_empty() {
        return None;
    }

    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => digits.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => digits.replace(',', ""),
        (None, Some(comma)) => {
            let decimals = digits.len() - comma - 1;
            if decimals == 2 && digits.matches(',').count() == 1 {
                digits.replace(',', ".")
            } else {
                digits.replace(',', "")
            }
        }
        (Some(_), None) if digits.matches('.').count() > 1 => digits.replace('.', ""),
        _ => digits.to_string(),
    };

    normalized.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Numeric JSON values as-is, strings through [`parse_price`]. Some APIs
/// (Epic) publish prices in cents; callers divide where needed.
pub fn price_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

/// `"-35%"`, `"35"`, `"35.4"` → 35. Values outside 0..=100 are clamped.
pub fn parse_percentage(raw: &str) -> Option<u8> {
    let caps = PERCENT.captures(raw)?;
    let value: f64 = caps[1].replace(',', ".").parse().ok()?;
    Some(value.round().clamp(0.0, 100.0) as u8)
}

pub fn percentage_from_value(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v.abs().round().clamp(0.0, 100.0) as u8),
        Value::String(s) => parse_percentage(s),
        _ => None,
    }
}

pub fn estimate_end_date(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now + Duration::days(days)
}

fn canonical_link(link: &str) -> String {
    link.trim().trim_end_matches('/').to_lowercase()
}

/// Drop repeated listings, keeping the first occurrence and the input order.
/// Two listings are the same game when their links match, or failing that
/// their titles match case-insensitively.
pub fn dedup_listings(listings: Vec<GameListing>) -> Vec<GameListing> {
    let mut links = HashSet::new();
    let mut titles = HashSet::new();

    listings
        .into_iter()
        .filter(|l| {
            let fresh_link = links.insert(canonical_link(&l.link));
            let fresh_title = titles.insert(l.title.to_lowercase());
            fresh_link && fresh_title
        })
        .collect()
}
