//! Staging directory watcher.
//!
//! Runs one batch at startup, then another whenever new candidate files
//! show up in staging. A batch only starts once the sizes of every
//! candidate file have stayed the same for the stability delay, so files
//! still being copied in are never picked up. Batches never overlap: events
//! that arrive while a batch is running (including the pipeline's own
//! moves) are drained before waiting again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use glob::Pattern;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::paths;
use crate::core::Driver;

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Watch directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

/// Debounce window for filesystem events
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// How long candidate sizes must stay unchanged before a batch starts
pub const DEFAULT_STABILITY_DELAY: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Candidate file sizes in staging, keyed by path
pub type Snapshot = HashMap<PathBuf, u64>;

/// Watches staging and triggers driver batches
pub struct StagingWatcher {
    driver: Arc<Driver>,
    debounce: Duration,
    stability_delay: Duration,
}

impl StagingWatcher {
    pub fn new(driver: Arc<Driver>) -> Self {
        Self {
            driver,
            debounce: DEFAULT_DEBOUNCE,
            stability_delay: DEFAULT_STABILITY_DELAY,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_stability_delay(mut self, delay: Duration) -> Self {
        self.stability_delay = delay;
        self
    }

    /// Start watching in a background task
    pub fn watch(&self) -> Result<WatchHandle, WatcherError> {
        let staging = self.driver.config().staging.clone();
        if !staging.is_dir() {
            return Err(WatcherError::DirectoryNotFound(staging));
        }

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let driver = self.driver.clone();
        let debounce = self.debounce;
        let stability_delay = self.stability_delay;

        let task = tokio::spawn(async move {
            if let Err(e) = run_watcher(driver, debounce, stability_delay, &mut stop_rx).await {
                tracing::error!("Watcher error: {}", e);
            }
        });

        Ok(WatchHandle { stop_tx, task })
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher once the current batch (if any) has drained
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Whether an event path could produce new queue items
pub fn is_candidate(path: &Path, pattern: &Pattern) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .map(|name| pattern.matches(&name) && !paths::is_transcoded_name(&name))
        .unwrap_or(false)
}

/// Sizes of the candidate files currently in staging
pub fn candidate_sizes(staging: &Path, pattern: &Pattern) -> Snapshot {
    let mut sizes = Snapshot::new();
    let entries = match std::fs::read_dir(staging) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", staging.display(), e);
            return sizes;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !is_candidate(&path, pattern) {
            continue;
        }
        if let Ok(metadata) = entry.metadata() {
            if metadata.is_file() {
                sizes.insert(path, metadata.len());
            }
        }
    }

    sizes
}

async fn run_batch(driver: &Driver) {
    match driver.run_batch().await {
        Ok(report) if report.is_empty() => {}
        Ok(report) => tracing::info!(
            "Batch finished: {} relocated, {} quarantined, {} need attention",
            report.relocated(),
            report.quarantined(),
            report.needs_attention()
        ),
        Err(e) => tracing::error!("Batch failed: {:#}", e),
    }
}

/// Internal watcher loop
async fn run_watcher(
    driver: Arc<Driver>,
    debounce: Duration,
    stability_delay: Duration,
    stop_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let staging = driver.config().staging.clone();
    let pattern = driver.config().file_pattern.clone();

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(debounce, tx)?;
    debouncer
        .watcher()
        .watch(&staging, RecursiveMode::NonRecursive)?;

    tracing::info!("Watching {} for new files", staging.display());

    // Staging snapshot waiting to settle (sizes, last change seen). The
    // startup batch waits for it like any other.
    let mut pending: Option<(Snapshot, Instant)> =
        Some((candidate_sizes(&staging, &pattern), Instant::now()));
    // Staging as the last batch left it
    let mut settled = Snapshot::new();

    loop {
        if stop_rx.try_recv().is_ok() {
            tracing::info!("Watcher stopping...");
            break;
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(events)) => {
                if events.iter().any(|e| is_candidate(&e.path, &pattern)) {
                    let snapshot = candidate_sizes(&staging, &pattern);
                    // Our own moves show up as events too
                    if pending.is_some() || snapshot != settled {
                        pending = Some((snapshot, Instant::now()));
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watcher error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("Watcher channel disconnected");
                break;
            }
        }

        let due = matches!(&pending, Some((_, last_seen)) if last_seen.elapsed() >= stability_delay);
        if due {
            let current = candidate_sizes(&staging, &pattern);
            let unchanged = matches!(&pending, Some((last, _)) if *last == current);

            if unchanged {
                pending = None;
                run_batch(&driver).await;
                while rx.try_recv().is_ok() {}
                settled = candidate_sizes(&staging, &pattern);
            } else {
                tracing::debug!("Staging still changing, waiting for it to settle");
                pending = Some((current, Instant::now()));
            }
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_candidate() {
        let pattern = Pattern::new(paths::DEFAULT_FILE_PATTERN).unwrap();
        assert!(is_candidate(Path::new("/staging/movie.mkv"), &pattern));
        assert!(!is_candidate(Path::new("/staging/movie-transcoded.mkv"), &pattern));
        assert!(!is_candidate(Path::new("/staging/notes.txt"), &pattern));
        assert!(!is_candidate(Path::new("/"), &pattern));
    }

    #[test]
    fn test_candidate_sizes_only_tracks_sources() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("movie.mkv"), b"12345").unwrap();
        std::fs::write(temp.path().join("movie-transcoded.mkv"), b"12").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"1").unwrap();
        std::fs::create_dir(temp.path().join("failed")).unwrap();

        let pattern = Pattern::new(paths::DEFAULT_FILE_PATTERN).unwrap();
        let sizes = candidate_sizes(temp.path(), &pattern);

        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes.get(&temp.path().join("movie.mkv")), Some(&5));
    }

    #[test]
    fn test_candidate_sizes_of_missing_directory_is_empty() {
        let pattern = Pattern::new(paths::DEFAULT_FILE_PATTERN).unwrap();
        assert!(candidate_sizes(Path::new("/nonexistent/staging"), &pattern).is_empty());
    }
}
