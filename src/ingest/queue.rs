//! Queue checkpoint file.
//!
//! A plain list of absolute source paths, one per line, written after a
//! scan and deleted once the batch has attempted every item. There is no
//! per-item state: the file is either the whole pending batch or absent.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::config::Config;

/// Errors that can occur with the queue checkpoint
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("No queue file found at {0}. Run a scan first.")]
    Missing(PathBuf),

    #[error("IO error on queue file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The on-disk queue checkpoint
#[derive(Debug, Clone)]
pub struct QueueCheckpoint {
    path: PathBuf,
}

impl QueueCheckpoint {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Checkpoint at the configured location
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.queue_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the checkpoint with `items`
    pub async fn write(&self, items: &[PathBuf]) -> Result<(), QueueError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io(e))?;
        }

        let content = items
            .iter()
            .map(|p| path_bytes(p))
            .collect::<Vec<_>>()
            .join(&b'\n');

        fs::write(&self.path, content).await.map_err(|e| self.io(e))
    }

    /// Read the queued paths in order
    pub async fn read(&self) -> Result<Vec<PathBuf>, QueueError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QueueError::Missing(self.path.clone()));
            }
            Err(e) => return Err(self.io(e)),
        };

        Ok(content
            .split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(path_from_bytes)
            .collect())
    }

    /// Delete the checkpoint. A missing file is not an error.
    pub async fn clear(&self) -> Result<(), QueueError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io(e)),
        }
    }

    fn io(&self, source: std::io::Error) -> QueueError {
        QueueError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

// Paths are stored as raw bytes so names that are not UTF-8 survive
#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
