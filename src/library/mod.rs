//! Final placement of processed files.
//!
//! Successful transcodes go to the library, failures go to quarantine.
//!
//! # Layout
//!
//! ```text
//! <staging>/
//! ├── movie.mkv                 # source, removed after relocation
//! ├── movie-transcoded.mkv      # encoder output, moved to the library
//! └── failed/                   # quarantine for failed transcodes
//! <library>/
//! └── movie.mkv                 # transcoded copy under the original name
//! ```
//!
//! Neither operation is transactional. A crash between the two filesystem
//! steps leaves both copies on disk for manual cleanup.

pub mod quarantine;
pub mod relocate;

use std::io;
use std::path::Path;

use tokio::fs;

pub use quarantine::{quarantine, QuarantineError, QuarantineReport};
pub use relocate::{relocate, RelocateError};

/// Move a file, falling back to copy + delete when a rename is not possible
/// (for example across filesystems).
pub(crate) async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    let rename_err = match fs::rename(from, to).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !from.exists() {
        return Err(rename_err);
    }

    tracing::debug!(
        "Rename {} -> {} failed ({}), copying instead",
        from.display(),
        to.display(),
        rename_err
    );

    if let Err(e) = fs::copy(from, to).await {
        // Never leave a truncated copy behind
        let _ = fs::remove_file(to).await;
        return Err(e);
    }

    fs::remove_file(from).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_file() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.mkv");
        let to = temp.path().join("b.mkv");
        fs::write(&from, b"data").await.unwrap();

        move_file(&from, &to).await.unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_move_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = move_file(&temp.path().join("gone.mkv"), &temp.path().join("b.mkv")).await;
        assert!(result.is_err());
        assert!(!temp.path().join("b.mkv").exists());
    }
}
