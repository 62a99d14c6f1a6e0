//! Staging directory scanner.
//!
//! Lists candidate source files in staging and drops anything the library
//! already has (by exact file name) or anything that is itself encoder
//! output. No hashing, no timestamps.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use super::queue::{QueueCheckpoint, QueueError};
use crate::config::{paths, Config};

/// Errors that can occur while scanning
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Staging directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Result of a staging scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Absolute paths, in directory enumeration order
    pub queued: Vec<PathBuf>,
    pub already_in_library: usize,
    pub already_transcoded: usize,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn total_scanned(&self) -> usize {
        self.queued.len() + self.already_in_library + self.already_transcoded
    }
}

/// Scans one staging directory against one library directory
#[derive(Debug, Clone)]
pub struct Scanner {
    staging: PathBuf,
    library: PathBuf,
    pattern: Pattern,
}

impl Scanner {
    pub fn new(staging: PathBuf, library: PathBuf, pattern: Pattern) -> Self {
        Self {
            staging,
            library,
            pattern,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.staging.clone(),
            config.library.clone(),
            config.file_pattern.clone(),
        )
    }

    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// List the files in staging that still need a transcode
    pub async fn scan(&self) -> Result<ScanResult, ScanError> {
        if !self.staging.is_dir() {
            return Err(ScanError::DirectoryNotFound(self.staging.clone()));
        }
        let staging = fs::canonicalize(&self.staging).await?;

        let library_names = self.library_names().await?;
        let mut result = ScanResult::default();

        let mut entries = fs::read_dir(&staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if !self.pattern.matches(&name) {
                continue;
            }

            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!("Failed to stat {}: {}", entry.path().display(), e);
                    continue;
                }
            }

            if library_names.contains(&file_name) {
                info!("Skipping {} - already in plex", name);
                result.already_in_library += 1;
                continue;
            }

            if paths::is_transcoded_name(&name) {
                info!("Skipping {} - already transcoded", name);
                result.already_transcoded += 1;
                continue;
            }

            info!("Added to queue: {}", name);
            result.queued.push(entry.path());
        }

        Ok(result)
    }

    /// Names of matching files in the library (empty if it does not exist yet)
    async fn library_names(&self) -> Result<HashSet<OsString>, ScanError> {
        let mut names = HashSet::new();
        if !self.library.is_dir() {
            return Ok(names);
        }

        let mut entries = fs::read_dir(&self.library).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if self.pattern.matches(&name.to_string_lossy()) {
                names.insert(name);
            }
        }

        Ok(names)
    }
}

/// Scan the configured staging directory and write the queue checkpoint.
///
/// The checkpoint is only written when something was queued.
pub async fn scan_staging(
    config: &Config,
    queue: &QueueCheckpoint,
) -> Result<ScanResult, ScanError> {
    if config.test_mode {
        info!("Running in test mode - using test directory");
    }

    let result = Scanner::from_config(config).scan().await?;

    if result.is_empty() {
        info!("No new files to transcode");
    } else {
        queue.write(&result.queued).await?;
        info!("Queue created with {} files", result.queued.len());
    }

    Ok(result)
}
