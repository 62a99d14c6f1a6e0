//! HandBrakeCLI encoder.
//!
//! Builds the command line from an encoding profile and waits for the
//! process to exit. Encoder output goes straight to the terminal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::tools::{require_tool, ToolError, ENCODER_BIN};
use super::{EncodeJob, Encoder, EncoderExit};

/// Encoder backed by the `HandBrakeCLI` binary
#[derive(Debug, Clone)]
pub struct HandBrakeEncoder {
    binary_path: PathBuf,
}

impl HandBrakeEncoder {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Find HandBrakeCLI on `PATH`
    pub fn from_path() -> Result<Self, ToolError> {
        Ok(Self::new(require_tool(ENCODER_BIN)?))
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

/// HandBrakeCLI arguments for a job.
///
/// Scaling and filter flags are only emitted when the profile sets them.
pub fn command_args(job: &EncodeJob) -> Vec<String> {
    let profile = &job.profile;
    let mut args = vec![
        "-i".to_string(),
        job.input.to_string_lossy().into_owned(),
        "-o".to_string(),
        job.output.to_string_lossy().into_owned(),
        "--encoder".to_string(),
        profile.encoder.clone(),
        "--quality".to_string(),
        profile.quality.to_string(),
        "--encoder-preset".to_string(),
        profile.preset.clone(),
        "--audio-lang-list".to_string(),
        profile.audio.lang_list.clone(),
    ];

    if profile.audio.all_tracks {
        args.push("--all-audio".to_string());
    }

    args.extend([
        "--aencoder".to_string(),
        profile.audio.encoder.clone(),
        "--audio-fallback".to_string(),
        profile.audio.fallback.clone(),
        "--format".to_string(),
        profile.format.clone(),
    ]);

    if let Some(width) = profile.max_width {
        args.extend(["--max-width".to_string(), width.to_string()]);
    }
    if let Some(height) = profile.max_height {
        args.extend(["--max-height".to_string(), height.to_string()]);
    }
    if let Some(ref decomb) = profile.decomb {
        args.extend(["--decomb".to_string(), decomb.clone()]);
    }
    if let Some(ref deinterlace) = profile.deinterlace {
        args.extend(["--deinterlace".to_string(), deinterlace.clone()]);
    }

    args
}

#[async_trait]
impl Encoder for HandBrakeEncoder {
    fn name(&self) -> &str {
        ENCODER_BIN
    }

    async fn encode(&self, job: &EncodeJob) -> Result<EncoderExit> {
        let args = command_args(job);
        tracing::info!("Running command: {} {}", self.binary_path.display(), args.join(" "));

        let status = Command::new(&self.binary_path)
            .args(&args)
            .status()
            .await
            .with_context(|| format!("Failed to launch {}", self.binary_path.display()))?;

        Ok(status.into())
    }
}
