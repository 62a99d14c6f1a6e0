//! Adapter interfaces for external tools.
//!
//! The pipeline never encodes or parses media itself. It asks an
//! [`Inspector`] for the source resolution and hands the actual work to an
//! [`Encoder`]. The default implementations shell out to `mediainfo` and
//! `HandBrakeCLI`.

pub mod handbrake;
pub mod mediainfo;
pub mod tools;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{EncodingProfile, Tier};

// Re-export the default adapters
pub use handbrake::HandBrakeEncoder;
pub use mediainfo::MediaInfoInspector;
pub use tools::{check_tools, require_tool, ToolError, ToolInfo};

/// Reads the video resolution of a file
#[async_trait]
pub trait Inspector: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Raw `WIDTHxHEIGHT` report for the video stream.
    ///
    /// An empty string means the tool ran but found nothing.
    async fn dimensions(&self, path: &Path) -> Result<String>;
}

/// Runs one transcode
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Run the encoder to completion. An `Err` means the process could not
    /// be launched or waited on.
    async fn encode(&self, job: &EncodeJob) -> Result<EncoderExit>;
}

/// Everything an encoder needs for one file
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub tier: Tier,
    pub profile: EncodingProfile,
}

/// Exit status of an encoder run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderExit {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl EncoderExit {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for EncoderExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// The inspector/encoder pair used for a process
#[derive(Clone)]
pub struct Toolchain {
    pub inspector: Arc<dyn Inspector>,
    pub encoder: Arc<dyn Encoder>,
}

impl Toolchain {
    pub fn new(inspector: Arc<dyn Inspector>, encoder: Arc<dyn Encoder>) -> Self {
        Self { inspector, encoder }
    }

    /// Locate `mediainfo` and `HandBrakeCLI` on `PATH`.
    ///
    /// Fails with [`ToolError::DependencyMissing`] if either is absent.
    pub fn locate() -> Result<Self, ToolError> {
        let inspector = MediaInfoInspector::from_path()?;
        tracing::info!("Found {} at: {}", tools::INSPECTOR_BIN, inspector.binary_path().display());

        let encoder = HandBrakeEncoder::from_path()?;
        tracing::info!("Found {} at: {}", tools::ENCODER_BIN, encoder.binary_path().display());

        Ok(Self::new(Arc::new(inspector), Arc::new(encoder)))
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("inspector", &self.inspector.name())
            .field("encoder", &self.encoder.name())
            .finish()
    }
}
