use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::config::ScraperConfig;
use crate::fetch::FetchError;
use crate::global::Global;
use crate::types::GameListing;
use crate::util::sleep_until_aligned;

pub mod sources;

pub use sources::Source;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected upstream shape: {0}")]
    Shape(String),
    #[error("deadline elapsed before the source finished")]
    Deadline,
    #[error("source is disabled")]
    Disabled,
    #[error("upstream body contained no listings")]
    NoListings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Serve fresh cache entries without touching the network.
    Cached,
    /// Always go upstream, refreshing the cache.
    Fresh,
}

/// What a parser needs besides the body itself.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub now: DateTime<Utc>,
    /// Page the body came from; relative links are resolved against it.
    pub base: Option<Url>,
    pub estimated_promo_days: i64,
    pub include_upcoming: bool,
}

impl ParseContext {
    pub fn new(config: &ScraperConfig, page_url: &str) -> Self {
        Self {
            now: Utc::now(),
            base: Url::parse(page_url).ok(),
            estimated_promo_days: config.estimated_promo_days,
            include_upcoming: config.include_upcoming,
        }
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }
}

/// Fetch (through cache, rate limiter and retries) and parse one source.
///
/// A fetched body is cached only when it parses into at least one listing,
/// so a challenge page or an emptied layout never displaces a good entry.
#[tracing::instrument(name = "extract", skip(global), fields(source = source.name()))]
pub async fn extract(global: &Global, source: Source, mode: FetchMode) -> Result<Vec<GameListing>, ExtractError> {
    let settings = global.config.source(source.name());
    if !settings.enabled {
        return Err(ExtractError::Disabled);
    }

    let url = settings.url.unwrap_or_else(|| source.default_url().to_string());
    let request = source.request(&url);
    let key = request.cache_key();
    let ctx = ParseContext::new(&global.config.scraper, &url);

    let mut parsed = None;
    let parsed_slot = &mut parsed;
    let ctx_ref = &ctx;
    let produce = move || async move {
        let body = global
            .resilience
            .call(|| global.fetcher.fetch(&request), FetchError::is_transient)
            .await?;

        // Only a body that yields listings may replace the cached one
        let listings = source.parse(&body, ctx_ref)?;
        if listings.is_empty() {
            return Err(ExtractError::NoListings);
        }

        *parsed_slot = Some(listings);
        Ok::<_, ExtractError>(body)
    };

    let fetched = match mode {
        FetchMode::Cached => global.cache.get_or_fetch(&key, produce).await,
        FetchMode::Fresh => global.cache.refresh(&key, produce).await,
    };

    let body = match fetched {
        Ok(body) => body,
        Err(ExtractError::NoListings) => {
            // usually a layout change upstream
            tracing::warn!("no listings found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let listings = match parsed.take() {
        Some(listings) => listings,
        None => source.parse(&body, &ctx)?,
    };

    if listings.is_empty() {
        tracing::warn!("no listings found in cached body");
    } else {
        tracing::debug!(count = listings.len(), "extracted listings");
    }

    Ok(listings)
}

#[tracing::instrument(name = "Scraper", skip_all)]
pub async fn run(global: Arc<Global>) -> anyhow::Result<()> {
    if !global.config.scraper.enabled {
        tracing::info!("scraper is disabled");
        // Park forever so tokio::select doesn't exit
        std::future::pending::<()>().await;
        return Ok(());
    }

    let interval_secs = global.config.scraper.interval_secs;
    tracing::info!(interval_secs, "starting scraper");

    loop {
        if let Err(e) = crate::aggregate::scrape_and_store(&global).await {
            tracing::error!(error = %e, "scheduled scrape failed");
        }

        sleep_until_aligned(interval_secs).await;
    }
}
