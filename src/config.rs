//! Configuration for reelqueue.
//!
//! Configuration sources (highest priority first):
//! 1. `--config <path>` or the REELQUEUE_CONFIG environment variable
//! 2. `config.yaml` in the current directory
//! 3. `<user config dir>/reelqueue/config.yaml`
//!
//! Paths in the config file are relative to the config file's parent
//! directory. The resolved [`Config`] is built once per process and passed
//! to every component explicitly.

pub mod paths;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{EncodingProfile, ProfileSet, Tier};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config file found (looked in {0})")]
    NotFound(String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing preset for tier '{0}'")]
    MissingPreset(Tier),

    #[error("test_mode is enabled but paths.test is not set")]
    MissingTestPath,

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub paths: PathsConfig,
    #[serde(default)]
    pub test_mode: bool,
    /// Glob for source files (default `*.mkv`)
    #[serde(default)]
    pub file_pattern: Option<String>,
    pub presets: HashMap<Tier, EncodingProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Staging directory for new source files
    pub staging: String,
    /// Staging replacement used when test_mode is on
    #[serde(default)]
    pub test: Option<String>,
    /// Library (Plex) directory
    pub plex: String,
    pub queue_file: Option<String>,
    pub log_dir: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for new files (test path when test_mode is on)
    pub staging: PathBuf,
    /// Library destination for finished transcodes
    pub library: PathBuf,
    pub test_mode: bool,
    /// Queue checkpoint file
    pub queue_file: PathBuf,
    pub log_dir: PathBuf,
    pub file_pattern: Pattern,
    pub profiles: ProfileSet,
    /// Path to config file (if loaded from one)
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration, using `explicit` when given and discovery otherwise
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let candidates = default_locations();
                match candidates.iter().find(|p| p.exists()) {
                    Some(path) => Self::from_file(path),
                    None => Err(ConfigError::NotFound(
                        candidates
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect::<Vec<_>>()
                            .join(", "),
                    )),
                }
            }
        }
    }

    /// Load and resolve a specific config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file: ConfigFile =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let base_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::resolve(file, base_dir)?;
        config.config_file = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse YAML text, resolving relative paths against `base_dir`
    pub fn from_yaml(yaml: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::resolve(file, base_dir)
    }

    fn resolve(file: ConfigFile, base_dir: &Path) -> Result<Self, ConfigError> {
        let staging = if file.test_mode {
            let test = file.paths.test.as_deref().ok_or(ConfigError::MissingTestPath)?;
            resolve_path(base_dir, test)
        } else {
            resolve_path(base_dir, &file.paths.staging)
        };

        let pattern_str = file
            .file_pattern
            .as_deref()
            .unwrap_or(paths::DEFAULT_FILE_PATTERN);
        let file_pattern =
            Pattern::new(pattern_str).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern_str.to_string(),
                source,
            })?;

        let profiles = ProfileSet::from_map(file.presets).map_err(ConfigError::MissingPreset)?;

        Ok(Self {
            staging,
            library: resolve_path(base_dir, &file.paths.plex),
            test_mode: file.test_mode,
            queue_file: resolve_path(
                base_dir,
                file.paths
                    .queue_file
                    .as_deref()
                    .unwrap_or(paths::DEFAULT_QUEUE_FILE),
            ),
            log_dir: resolve_path(
                base_dir,
                file.paths.log_dir.as_deref().unwrap_or(paths::DEFAULT_LOG_DIR),
            ),
            file_pattern,
            profiles,
            config_file: None,
        })
    }

    /// Quarantine directory beneath the active staging directory
    pub fn quarantine_dir(&self) -> PathBuf {
        paths::quarantine_dir(&self.staging)
    }
}

/// Config file locations searched when no explicit path is given
fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("reelqueue").join(CONFIG_FILE_NAME));
    }
    locations
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}
