//! Transcode invocation for a single source file.
//!
//! Picks a profile from the source resolution, runs the encoder and
//! reports one [`TranscodeOutcome`]. An encoder failure is a value, not an
//! error: the caller routes it to quarantine.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapters::{EncodeJob, Inspector, Toolchain};
use crate::config::paths;
use crate::domain::{Dimensions, ProfileSet, Tier};

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Result of one encoder attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    /// Encoder exited zero and the output file exists
    Succeeded { output: PathBuf },

    /// Anything else
    Failed { reason: String },
}

impl TranscodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Which profile was chosen and why
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSelection {
    pub tier: Tier,
    /// Detected resolution, `None` when detection failed
    pub dimensions: Option<Dimensions>,
    /// True when the tier is the fallback rather than a measurement
    pub degraded: bool,
}

impl ProfileSelection {
    fn fallback() -> Self {
        Self {
            tier: Tier::FALLBACK,
            dimensions: None,
            degraded: true,
        }
    }
}

/// Ask the inspector for the source resolution and map it to a tier.
///
/// Any inspector problem selects the highest tier.
pub async fn select_profile(inspector: &dyn Inspector, source: &Path) -> ProfileSelection {
    let report = match inspector.dimensions(source).await {
        Ok(report) => report,
        Err(e) => {
            error!("Error running {}: {:#}", inspector.name(), e);
            warn!("Falling back to {} preset for {}", Tier::FALLBACK, source.display());
            return ProfileSelection::fallback();
        }
    };

    if report.trim().is_empty() {
        warn!(
            "Could not detect dimensions for {}, using {} preset",
            source.display(),
            Tier::FALLBACK
        );
        return ProfileSelection::fallback();
    }

    match Dimensions::parse(&report) {
        Some(dimensions) => {
            info!("Detected source resolution: {}", dimensions);
            ProfileSelection {
                tier: Tier::for_dimensions(dimensions),
                dimensions: Some(dimensions),
                degraded: false,
            }
        }
        None => {
            warn!(
                "Unrecognised resolution report {:?} for {}, using {} preset",
                report,
                source.display(),
                Tier::FALLBACK
            );
            ProfileSelection::fallback()
        }
    }
}

/// Transcode `source` into its `-transcoded` sibling
pub async fn transcode_file(
    source: &Path,
    profiles: &ProfileSet,
    tools: &Toolchain,
) -> Result<TranscodeOutcome, TranscodeError> {
    if !source.exists() {
        return Err(TranscodeError::SourceNotFound(source.to_path_buf()));
    }

    let output = paths::transcoded_sibling(source);
    let selection = select_profile(tools.inspector.as_ref(), source).await;
    let name = source.file_name().unwrap_or_default().to_string_lossy();

    info!("Transcoding {} using {} preset", name, selection.tier);
    if let Ok(metadata) = tokio::fs::metadata(source).await {
        info!("Source size: {:.2}GB", gigabytes(metadata.len()));
    }

    let job = EncodeJob {
        input: source.to_path_buf(),
        output: output.clone(),
        tier: selection.tier,
        profile: profiles.get(selection.tier).clone(),
    };

    let exit = match tools.encoder.encode(&job).await {
        Ok(exit) => exit,
        Err(e) => {
            error!("{} error: {:#}", tools.encoder.name(), e);
            return Ok(TranscodeOutcome::Failed {
                reason: format!("{:#}", e),
            });
        }
    };

    if !exit.success() {
        let reason = match exit.code {
            Some(code) => format!("{} exited with code {}", tools.encoder.name(), code),
            None => format!("{} was terminated by a signal", tools.encoder.name()),
        };
        error!("Transcode failed: {}", reason);
        return Ok(TranscodeOutcome::Failed { reason });
    }

    if !output.exists() {
        let reason = format!(
            "{} exited successfully but {} was not written",
            tools.encoder.name(),
            output.display()
        );
        error!("Transcode failed: {}", reason);
        return Ok(TranscodeOutcome::Failed { reason });
    }

    info!(
        "Transcode successful: {}",
        output.file_name().unwrap_or_default().to_string_lossy()
    );
    if let Ok(metadata) = tokio::fs::metadata(&output).await {
        info!("Output size: {:.2}GB", gigabytes(metadata.len()));
    }

    Ok(TranscodeOutcome::Succeeded { output })
}

fn gigabytes(bytes: u64) -> f64 {
    bytes as f64 / 1e9
}
