//! Quarantine for sources whose transcode failed.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::info;

use super::move_file;
use crate::config::paths;

#[derive(Debug, Error)]
pub enum QuarantineError {
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Error moving failed files ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the quarantined files ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantineReport {
    pub source: PathBuf,
    /// Partial encoder output, if one had been written
    pub partial: Option<PathBuf>,
}

/// Move `source` and its partial transcoded sibling (if any) into
/// `<staging>/failed/`.
pub async fn quarantine(source: &Path, staging: &Path) -> Result<QuarantineReport, QuarantineError> {
    if !source.exists() {
        return Err(QuarantineError::SourceNotFound(source.to_path_buf()));
    }

    let failed_dir = paths::quarantine_dir(staging);
    fs::create_dir_all(&failed_dir)
        .await
        .map_err(|e| io_error(&failed_dir, e))?;

    let name = source.file_name().unwrap_or_default();
    let source_dest = failed_dir.join(name);
    info!("Moving {} to failed directory", name.to_string_lossy());
    move_file(source, &source_dest)
        .await
        .map_err(|e| io_error(source, e))?;

    let transcoded = paths::transcoded_sibling(source);
    let partial = if transcoded.exists() {
        let transcoded_name = transcoded.file_name().unwrap_or_default();
        let dest = failed_dir.join(transcoded_name);
        info!(
            "Moving partial transcode {} to failed directory",
            transcoded_name.to_string_lossy()
        );
        move_file(&transcoded, &dest)
            .await
            .map_err(|e| io_error(&transcoded, e))?;
        Some(dest)
    } else {
        None
    };

    info!("Failed files moved successfully");
    Ok(QuarantineReport {
        source: source_dest,
        partial,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> QuarantineError {
    QuarantineError::Io {
        path: path.to_path_buf(),
        source,
    }
}
