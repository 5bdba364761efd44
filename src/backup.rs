//! Last-resort snapshot of a full aggregate run.
//!
//! Read-only from the aggregator's point of view: it only substitutes buckets
//! from here, it never triggers a scrape to refill them. The snapshot is
//! allowed to be arbitrarily old.

use std::path::PathBuf;

use anyhow::Context as _;
use tokio::sync::RwLock;

use crate::config::BackupConfig;
use crate::types::AggregateResult;
use crate::util::write_atomic;

#[derive(Debug, Default)]
pub struct BackupStore {
    path: Option<PathBuf>,
    snapshot: RwLock<Option<AggregateResult>>,
}

impl BackupStore {
    pub fn in_memory(snapshot: Option<AggregateResult>) -> Self {
        Self {
            path: None,
            snapshot: RwLock::new(snapshot),
        }
    }

    #[tracing::instrument(name = "backup_open", skip_all)]
    pub async fn open(config: &BackupConfig) -> Self {
        let snapshot = match &config.path {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(raw) => match serde_json::from_str::<AggregateResult>(&raw) {
                    Ok(snapshot) => {
                        tracing::info!(listings = snapshot.listing_count(), path = %path.display(), "loaded backup snapshot");
                        Some(snapshot)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "backup snapshot corrupt, ignoring");
                        None
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "backup snapshot unreadable, ignoring");
                    None
                }
            },
            None => None,
        };

        Self {
            path: config.path.clone(),
            snapshot: RwLock::new(snapshot),
        }
    }

    pub async fn snapshot(&self) -> Option<AggregateResult> {
        self.snapshot.read().await.clone()
    }

    /// Replace the snapshot in memory and on disk.
    pub async fn save(&self, result: &AggregateResult) -> anyhow::Result<()> {
        if let Some(path) = &self.path {
            let json = serde_json::to_vec_pretty(result).context("serializing backup snapshot")?;
            write_atomic(path, &json).await?;
        }

        *self.snapshot.write().await = Some(result.clone());
        tracing::info!(listings = result.listing_count(), "saved backup snapshot");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ListingDraft;
    use crate::stores::Store;

    fn snapshot() -> AggregateResult {
        let listing = ListingDraft {
            title: Some("Rocket League".into()),
            link: Some("https://store.epicgames.com/en-US/p/rocket-league".into()),
            ..Default::default()
        }
        .build(Store::Epic, None)
        .unwrap();

        let mut result = AggregateResult::default();
        result.permanent.pc.insert("epic_games".into(), vec![listing]);
        result
    }

    #[tokio::test]
    async fn save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = BackupConfig {
            path: Some(dir.path().join("backup.json")),
        };

        let store = BackupStore::open(&config).await;
        assert!(store.snapshot().await.is_none());

        store.save(&snapshot()).await.unwrap();
        assert_eq!(store.snapshot().await, Some(snapshot()));

        let reopened = BackupStore::open(&config).await;
        assert_eq!(reopened.snapshot().await, Some(snapshot()));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = BackupStore::open(&BackupConfig { path: Some(path) }).await;
        assert!(store.snapshot().await.is_none());
    }
}
