//! MediaInfo inspector.
//!
//! Shells out to `mediainfo --Inform=Video;%Width%x%Height% <file>`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::tools::{require_tool, ToolError, INSPECTOR_BIN};
use super::Inspector;

/// Template printing the video stream size as `WIDTHxHEIGHT`
const DIMENSIONS_INFORM: &str = "--Inform=Video;%Width%x%Height%";

/// Inspector backed by the `mediainfo` CLI
#[derive(Debug, Clone)]
pub struct MediaInfoInspector {
    binary_path: PathBuf,
}

impl MediaInfoInspector {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Find mediainfo on `PATH`
    pub fn from_path() -> Result<Self, ToolError> {
        Ok(Self::new(require_tool(INSPECTOR_BIN)?))
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl Inspector for MediaInfoInspector {
    fn name(&self) -> &str {
        INSPECTOR_BIN
    }

    async fn dimensions(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.binary_path)
            .arg(DIMENSIONS_INFORM)
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run mediainfo on {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "mediainfo failed with exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
