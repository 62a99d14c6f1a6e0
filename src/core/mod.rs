//! Core batch logic.
//!
//! - Driver: scan → transcode → relocate | quarantine, one item at a time

pub mod driver;

pub use driver::Driver;
