//! Time-boxed store of upstream response bodies, keyed by request.
//!
//! An entry is fresh while younger than the freshness window and is purged
//! once older than twice the window. Between the two it is only served when
//! a live fetch fails. Failed fetches are never stored.
//!
//! Fills of the same key are serialized: a caller that waited on another
//! caller's fill reuses its body instead of fetching again.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::config::CacheConfig;
use crate::util::write_atomic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub data: String,
}

impl CacheEntry {
    fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug)]
pub struct ResponseCache {
    freshness: Duration,
    path: Option<PathBuf>,
    store_empty: bool,
    entries: RwLock<HashMap<String, CacheEntry>>,
    fill_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    persist_lock: Mutex<()>,
}

impl ResponseCache {
    pub fn new(freshness: Duration, path: Option<PathBuf>, store_empty: bool) -> Self {
        Self {
            freshness,
            path,
            store_empty,
            entries: RwLock::new(HashMap::new()),
            fill_locks: Mutex::new(HashMap::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Open the cache described by `config`, loading its file if present.
    /// An unreadable file is logged and the cache starts empty.
    #[tracing::instrument(name = "cache_open", skip_all)]
    pub async fn open(config: &CacheConfig) -> Self {
        let cache = Self::new(config.freshness(), config.path.clone(), config.store_empty);

        if let Some(path) = &cache.path {
            match tokio::fs::read_to_string(path).await {
                Ok(raw) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                    Ok(entries) => {
                        tracing::info!(count = entries.len(), path = %path.display(), "loaded cache");
                        *cache.entries.write().await = entries;
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "cache file corrupt, starting empty");
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "no cache file yet");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                }
            }
        }

        cache.sweep().await;
        cache
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Serve `key` from cache while fresh; otherwise run `producer` and store
    /// its result. If `producer` fails and a stale entry is still held, the
    /// stale data is returned instead of the error.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, producer: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: std::fmt::Display,
    {
        if let Some(data) = self.fresh(key).await {
            tracing::debug!(key, "cache hit");
            return Ok(data);
        }

        let lock = self.fill_lock(key).await;
        let _guard = lock.lock().await;

        if let Some(data) = self.fresh(key).await {
            tracing::debug!(key, "cache filled while waiting");
            return Ok(data);
        }

        self.fill(key, producer).await
    }

    /// Run `producer`, bypassing any entry stored before this call began.
    pub async fn refresh<F, Fut, E>(&self, key: &str, producer: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: std::fmt::Display,
    {
        let started = Utc::now();
        let lock = self.fill_lock(key).await;
        let _guard = lock.lock().await;

        if let Some(data) = self.stored_since(key, started).await {
            tracing::debug!(key, "cache refreshed while waiting");
            return Ok(data);
        }

        self.fill(key, producer).await
    }

    async fn fill_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.fill_locks.lock().await.entry(key.to_string()).or_default().clone()
    }

    async fn fill<F, Fut, E>(&self, key: &str, producer: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: std::fmt::Display,
    {
        match producer().await {
            Ok(data) => {
                self.store(key, &data).await;
                Ok(data)
            }
            Err(e) => match self.stale(key).await {
                Some(data) => {
                    tracing::warn!(key, error = %e, "fetch failed, serving stale cache entry");
                    Ok(data)
                }
                None => Err(e),
            },
        }
    }

    async fn fresh(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.age(now) < self.freshness)
            .map(|entry| entry.data.clone())
    }

    async fn stored_since(&self, key: &str, since: DateTime<Utc>) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.timestamp >= since)
            .map(|entry| entry.data.clone())
    }

    async fn stale(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.age(now) <= self.freshness * 2)
            .map(|entry| entry.data.clone())
    }

    async fn store(&self, key: &str, data: &str) {
        if data.trim().is_empty() && !self.store_empty {
            tracing::debug!(key, "not caching empty body");
            return;
        }

        self.insert_entry(
            key,
            CacheEntry {
                timestamp: Utc::now(),
                data: data.to_string(),
            },
        )
        .await;
    }

    async fn insert_entry(&self, key: &str, entry: CacheEntry) {
        self.entries.write().await.insert(key.to_string(), entry);
        self.persist().await;
    }

    /// Drop entries older than twice the freshness window. Returns how many
    /// were removed.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, entry| entry.age(now) <= self.freshness * 2);
            before - entries.len()
        };

        if removed > 0 {
            tracing::info!(removed, "swept expired cache entries");
            self.persist().await;
        }

        removed
    }

    /// Sweep on a fixed interval. Never returns.
    #[tracing::instrument(name = "CacheSweeper", skip_all)]
    pub async fn sweep_every(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        // Serialized so an older snapshot never lands after a newer one.
        let _guard = self.persist_lock.lock().await;

        let json = {
            let entries = self.entries.read().await;
            serde_json::to_vec(&*entries)
        };

        let result = match json {
            Ok(json) => write_atomic(path, &json).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist cache");
        }
    }
}
