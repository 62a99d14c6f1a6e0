//! Filesystem layout conventions.
//!
//! Single source of truth for the names the pipeline derives from other
//! names. Import this instead of hardcoding suffixes or directory names.
//!
//! | Item | Location |
//! |------|----------|
//! | Transcoded sibling | `<staging>/<stem>-transcoded<.ext>` |
//! | Quarantine | `<staging>/failed/` |
//! | Library copy | `<library>/<name without marker>` |

use std::path::{Path, PathBuf};

/// Marker inserted before the extension of encoder output
pub const TRANSCODED_MARKER: &str = "-transcoded";

/// Quarantine subdirectory name beneath staging
pub const QUARANTINE_DIR_NAME: &str = "failed";

/// Default queue checkpoint file (relative to the config file)
pub const DEFAULT_QUEUE_FILE: &str = "queue.txt";

/// Default log directory (relative to the config file)
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Prefix of the rotated log files
pub const LOG_FILE_PREFIX: &str = "transcode";

/// Files the scanner picks up by default
pub const DEFAULT_FILE_PATTERN: &str = "*.mkv";

/// Path the encoder writes for `source`: same directory, marker before the extension
pub fn transcoded_sibling(source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let name = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, TRANSCODED_MARKER, ext.to_string_lossy()),
        None => format!("{}{}", stem, TRANSCODED_MARKER),
    };
    source.with_file_name(name)
}

/// Whether a file name carries the transcoded-output marker anywhere
pub fn is_transcoded_name(name: &str) -> bool {
    name.contains(TRANSCODED_MARKER)
}

/// File name with every occurrence of the marker removed
pub fn strip_marker(name: &str) -> String {
    name.replace(TRANSCODED_MARKER, "")
}

/// Original source for a transcoded file (same directory, marker stripped)
pub fn original_for(transcoded: &Path) -> PathBuf {
    let name = transcoded.file_name().unwrap_or_default().to_string_lossy();
    transcoded.with_file_name(strip_marker(&name))
}

/// Quarantine directory for a staging directory
pub fn quarantine_dir(staging: &Path) -> PathBuf {
    staging.join(QUARANTINE_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcoded_sibling_inserts_marker_before_extension() {
        assert_eq!(
            transcoded_sibling(Path::new("/staging/movie.mkv")),
            PathBuf::from("/staging/movie-transcoded.mkv")
        );
        assert_eq!(
            transcoded_sibling(Path::new("/staging/The.Movie.2019.mkv")),
            PathBuf::from("/staging/The.Movie.2019-transcoded.mkv")
        );
        assert_eq!(
            transcoded_sibling(Path::new("/staging/movie")),
            PathBuf::from("/staging/movie-transcoded")
        );
    }

    #[test]
    fn test_original_for_strips_marker() {
        assert_eq!(
            original_for(Path::new("/staging/movie-transcoded.mkv")),
            PathBuf::from("/staging/movie.mkv")
        );
    }

    #[test]
    fn test_strip_marker_removes_every_occurrence() {
        // A marker inside a legitimate title is removed as well
        assert_eq!(
            strip_marker("not-transcoded-yet-transcoded.mkv"),
            "not-yet.mkv"
        );
    }

    #[test]
    fn test_is_transcoded_name() {
        assert!(is_transcoded_name("movie-transcoded.mkv"));
        assert!(is_transcoded_name("c-transcoded-extra.mkv"));
        assert!(!is_transcoded_name("movie.mkv"));
        assert!(!is_transcoded_name("transcoded.mkv"));
    }

    #[test]
    fn test_quarantine_dir() {
        assert_eq!(
            quarantine_dir(Path::new("/media/staging")),
            PathBuf::from("/media/staging/failed")
        );
    }
}
