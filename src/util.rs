use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use uuid::Uuid;

/// Sleep until the next clock-aligned tick.
///
/// For example, with `interval_secs = 300` (5 min), if the current time is
/// 14:03:22, this sleeps until 14:05:00. With `interval_secs = 3600` (1 h),
/// it sleeps until 15:00:00.
pub async fn sleep_until_aligned(interval_secs: u64) {
    let interval_secs = interval_secs.max(1);
    let now = chrono::Utc::now();
    let current_secs = now.timestamp() as u64;
    let next_tick = (current_secs / interval_secs + 1) * interval_secs;
    let sleep_secs = next_tick - current_secs;

    tracing::debug!(
        next_tick_in_secs = sleep_secs,
        next_tick_at = %chrono::DateTime::from_timestamp(next_tick as i64, 0).unwrap_or_default(),
        "sleeping until next aligned tick"
    );

    tokio::time::sleep(std::time::Duration::from_secs(sleep_secs)).await;
}

/// Replace `path` with `bytes` through a temp file and a rename, so readers
/// never observe a half-written file.
///
/// The write runs on the blocking pool and finishes even if the caller is
/// dropped, so a cancelled caller leaves either the old or the new file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();

    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &bytes))
        .await
        .context("atomic write task failed")?
}

/// Temp file that is removed on drop unless it was renamed into place.
struct TempFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent.display()))?;

    let mut temp = TempFile {
        path: parent.join(format!(".{}.tmp", Uuid::new_v4())),
        committed: false,
    };

    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp.path)
        .with_context(|| format!("opening temp file {}", temp.path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("writing temp file {}", temp.path.display()))?;
    file.sync_all()
        .with_context(|| format!("syncing temp file {}", temp.path.display()))?;
    drop(file);

    fs::rename(&temp.path, path)
        .with_context(|| format!("renaming {} -> {}", temp.path.display(), path.display()))?;
    temp.committed = true;

    Ok(())
}
