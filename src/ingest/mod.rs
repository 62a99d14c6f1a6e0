//! Staging ingestion.
//!
//! 1. **Scanner**: finds new source files in staging
//! 2. **Queue**: flat checkpoint of the pending batch
//! 3. **Transcoder**: runs the encoder for one file
//! 4. **Watcher**: triggers batches when staging changes
//!
//! ```text
//! staging/*.mkv → Scanner → queue.txt → Transcoder → library | failed/
//! ```

pub mod queue;
pub mod scanner;
pub mod transcoder;
pub mod watcher;

// Re-export key types
pub use queue::{QueueCheckpoint, QueueError};
pub use scanner::{scan_staging, ScanError, ScanResult, Scanner};
pub use transcoder::{select_profile, transcode_file, ProfileSelection, TranscodeError, TranscodeOutcome};
pub use watcher::{StagingWatcher, WatchHandle, WatcherError};
