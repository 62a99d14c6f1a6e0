//! Domain types for reelqueue.
//!
//! - Profile: resolution tiers and the encoder settings for each
//! - Batch: queue run state and per-item outcomes

pub mod batch;
pub mod profile;

// Re-export commonly used types
pub use batch::{BatchReport, BatchState, ItemOutcome};
pub use profile::{AudioSettings, Dimensions, EncodingProfile, ProfileSet, Tier};
