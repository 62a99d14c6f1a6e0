//! Relocation of finished transcodes into the library.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::info;

use super::move_file;
use crate::config::paths;

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("Not a transcoded file (no '-transcoded' in name): {0}")]
    NotTranscodedOutput(PathBuf),

    #[error("Original file not found: {0}")]
    OriginalMissing(PathBuf),

    #[error("Transcoded file not found: {0}")]
    TranscodedFileMissing(PathBuf),

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Move `transcoded` into `library` under its original name, then delete
/// the original source. Returns the library path.
///
/// The original is only deleted after the move succeeded. Running this a
/// second time for the same item fails with
/// [`RelocateError::OriginalMissing`].
pub async fn relocate(transcoded: &Path, library: &Path) -> Result<PathBuf, RelocateError> {
    let name = transcoded
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    if !paths::is_transcoded_name(&name) {
        return Err(RelocateError::NotTranscodedOutput(transcoded.to_path_buf()));
    }

    let original = paths::original_for(transcoded);
    if !original.exists() {
        return Err(RelocateError::OriginalMissing(original));
    }
    if !transcoded.exists() {
        return Err(RelocateError::TranscodedFileMissing(transcoded.to_path_buf()));
    }

    fs::create_dir_all(library)
        .await
        .map_err(|source| RelocateError::Io {
            action: "create library directory",
            path: library.to_path_buf(),
            source,
        })?;

    let destination = library.join(paths::strip_marker(&name));

    info!("Moving {} to plex", name);
    move_file(transcoded, &destination)
        .await
        .map_err(|source| RelocateError::Io {
            action: "move",
            path: transcoded.to_path_buf(),
            source,
        })?;

    info!(
        "Deleting original file: {}",
        original.file_name().unwrap_or_default().to_string_lossy()
    );
    fs::remove_file(&original)
        .await
        .map_err(|source| RelocateError::Io {
            action: "delete",
            path: original.clone(),
            source,
        })?;

    info!("Move completed successfully");
    Ok(destination)
}
