//! reelqueue - staging-to-library transcode queue
//!
//! Moves video files from a staging directory through HandBrakeCLI, then
//! puts successes in the media library and failures in quarantine.
//!
//! # Architecture
//!
//! The only state is the filesystem:
//! - A scan writes the pending batch to a flat queue checkpoint
//! - Items are processed one at a time, front to back
//! - The checkpoint is deleted once every item has been attempted
//!
//! # Modules
//!
//! - `adapters`: External tools (mediainfo, HandBrakeCLI)
//! - `core`: Batch driver
//! - `domain`: Data structures (Tier, EncodingProfile, BatchReport)
//! - `ingest`: Scanner, queue checkpoint, transcoder, watcher
//! - `library`: Relocation and quarantine
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Process everything new in staging
//! reelqueue run
//!
//! # Individual steps
//! reelqueue scan
//! reelqueue transcode /media/staging/movie.mkv
//! reelqueue relocate /media/staging/movie-transcoded.mkv
//! reelqueue quarantine /media/staging/movie.mkv
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{EncodeJob, Encoder, EncoderExit, Inspector, Toolchain};
pub use config::Config;
pub use core::Driver;
pub use domain::{BatchReport, BatchState, Dimensions, EncodingProfile, ItemOutcome, Tier};
pub use ingest::{QueueCheckpoint, ScanResult, Scanner, TranscodeOutcome};
