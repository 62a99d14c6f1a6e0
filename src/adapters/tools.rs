//! External tool detection.

use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;

/// Resolution inspector binary
pub const INSPECTOR_BIN: &str = "mediainfo";

/// Encoder binary
pub const ENCODER_BIN: &str = "HandBrakeCLI";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} not found in PATH. Please install it first.")]
    DependencyMissing(String),
}

/// Information about an external tool
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    /// Resolved executable, `None` if not on PATH
    pub path: Option<PathBuf>,
    /// First line of the version output
    pub version: Option<String>,
}

impl ToolInfo {
    pub fn available(&self) -> bool {
        self.path.is_some()
    }
}

/// Require that a tool is on PATH, returning its path
pub fn require_tool(name: &str) -> Result<PathBuf, ToolError> {
    which::which(name).map_err(|_| ToolError::DependencyMissing(name.to_string()))
}

/// Check a tool and read its version line
pub async fn check_tool(name: &str, version_arg: &str) -> ToolInfo {
    let Ok(path) = which::which(name) else {
        return ToolInfo {
            name: name.to_string(),
            path: None,
            version: None,
        };
    };

    let version = match Command::new(&path).arg(version_arg).output().await {
        Ok(output) => String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string),
        Err(e) => {
            tracing::debug!("Failed to read {} version: {}", name, e);
            None
        }
    };

    ToolInfo {
        name: name.to_string(),
        path: Some(path),
        version,
    }
}

/// Check both tools the pipeline depends on
pub async fn check_tools() -> Vec<ToolInfo> {
    vec![
        check_tool(INSPECTOR_BIN, "--Version").await,
        check_tool(ENCODER_BIN, "--version").await,
    ]
}
