use std::sync::Arc;
use std::time::Duration;

use crate::backup::BackupStore;
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::resilience::{RateLimiter, Resilience, RetryPolicy};

pub struct Global {
    pub config: Config,
    pub fetcher: Fetcher,
    pub resilience: Resilience,
    pub cache: ResponseCache,
    pub backup: BackupStore,
    pub started_at: std::time::Instant,
}

impl Global {
    pub async fn init(config: Config) -> anyhow::Result<Arc<Self>> {
        let fetcher = Fetcher::new(&config.fetch)?;

        let resilience = Resilience::new(
            RateLimiter::new(Duration::from_millis(config.rate_limit.delay_ms)),
            RetryPolicy::from_config(&config.retry),
        );

        let cache = ResponseCache::open(&config.cache).await;
        let backup = BackupStore::open(&config.backup).await;

        tracing::info!(
            cache_entries = cache.len().await,
            has_backup = backup.snapshot().await.is_some(),
            "pipeline state loaded"
        );

        Ok(Arc::new(Self {
            config,
            fetcher,
            resilience,
            cache,
            backup,
            started_at: std::time::Instant::now(),
        }))
    }

    /// State with no rate limiting, no retries and nothing on disk.
    #[cfg(test)]
    pub(crate) fn in_memory(config: Config, backup: Option<crate::types::AggregateResult>) -> Self {
        Self {
            fetcher: Fetcher::new(&config.fetch).expect("http client"),
            resilience: Resilience::new(RateLimiter::new(Duration::ZERO), RetryPolicy::new(1, Duration::ZERO)),
            cache: ResponseCache::new(config.cache.freshness(), None, config.cache.store_empty),
            backup: BackupStore::in_memory(backup),
            started_at: std::time::Instant::now(),
            config,
        }
    }
}
