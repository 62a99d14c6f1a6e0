//! Command-line interface for reelqueue.
//!
//! Every pipeline step can be run on its own, plus a full batch and a
//! watch mode.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{check_tools, Toolchain};
use crate::config::{Config, ConfigError};
use crate::core::Driver;
use crate::domain::{ItemOutcome, Tier};
use crate::ingest::{scan_staging, transcode_file, QueueCheckpoint, StagingWatcher, TranscodeOutcome};
use crate::library::{quarantine, relocate};

/// reelqueue - staging-to-library transcode queue
#[derive(Parser, Debug)]
#[command(name = "reelqueue")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ./config.yaml, then the user config dir)
    #[arg(short, long, global = true, env = "REELQUEUE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan staging and write the queue file
    Scan,

    /// Transcode a single source file
    Transcode {
        /// Source video in staging
        source_file: PathBuf,
    },

    /// Move a finished transcode into the library and delete its original
    Relocate {
        /// The -transcoded file
        transcoded_file: PathBuf,
    },

    /// Move a failed source (and partial output) into quarantine
    Quarantine {
        /// Source video in staging
        source_file: PathBuf,
    },

    /// Scan and process the whole queue
    Run,

    /// Run a batch now and again whenever staging changes
    Watch,

    /// Check that mediainfo and HandBrakeCLI are installed
    Check,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// `config` is the result of loading configuration at startup; only
    /// commands that need it fail when it could not be loaded.
    pub async fn execute(self, config: Result<Config, ConfigError>) -> Result<()> {
        let config = match (&self.command, config) {
            (Commands::Check, _) => return check().await,
            (_, config) => config.context("Failed to load configuration")?,
        };

        match self.command {
            Commands::Scan => scan(&config).await,
            Commands::Transcode { source_file } => transcode(&config, &source_file).await,
            Commands::Relocate { transcoded_file } => {
                relocate(&transcoded_file, &config.library).await?;
                Ok(())
            }
            Commands::Quarantine { source_file } => {
                quarantine(&source_file, &config.staging).await?;
                Ok(())
            }
            Commands::Run => run(config).await,
            Commands::Watch => watch(config).await,
            Commands::Config => {
                show_config(&config);
                Ok(())
            }
            Commands::Check => check().await,
        }
    }
}

/// Scan staging and write the queue checkpoint
async fn scan(config: &Config) -> Result<()> {
    let queue = QueueCheckpoint::from_config(config);
    let result = scan_staging(config, &queue).await?;

    if !result.is_empty() {
        println!("{}", queue.path().display());
    }
    Ok(())
}

/// Transcode one file (tools must be installed)
async fn transcode(config: &Config, source: &Path) -> Result<()> {
    let tools = Toolchain::locate()?;

    match transcode_file(source, &config.profiles, &tools).await? {
        TranscodeOutcome::Succeeded { output } => {
            println!("{}", output.display());
            Ok(())
        }
        TranscodeOutcome::Failed { reason } => anyhow::bail!("Transcode failed: {}", reason),
    }
}

/// Run one full batch
async fn run(config: Config) -> Result<()> {
    let tools = Toolchain::locate()?;
    let driver = Driver::new(config, tools);

    let report = driver.run_batch().await?;

    if report.is_empty() {
        eprintln!("Nothing to do");
        return Ok(());
    }

    println!("{:<60} {:<20}", "FILE", "OUTCOME");
    println!("{}", "-".repeat(80));
    for (source, outcome) in &report.items {
        let name = source.file_name().unwrap_or_default().to_string_lossy();
        let outcome_str = match outcome {
            ItemOutcome::Relocated { .. } => "relocated".to_string(),
            ItemOutcome::Quarantined => "quarantined".to_string(),
            ItemOutcome::RelocationFailed { error } => {
                format!("relocation failed: {}", error)
            }
            ItemOutcome::QuarantineFailed { error } => {
                format!("quarantine failed: {}", error)
            }
        };
        println!("{:<60} {}", name, outcome_str);
    }

    Ok(())
}

/// Watch staging until Ctrl-C
async fn watch(config: Config) -> Result<()> {
    let tools = Toolchain::locate()?;
    let driver = Arc::new(Driver::new(config, tools));

    let handle = StagingWatcher::new(driver).watch()?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    eprintln!("\nStopping after the current batch...");
    handle.stop().await
}

/// Report tool availability
async fn check() -> Result<()> {
    let tools = check_tools().await;
    let mut missing = Vec::new();

    for tool in &tools {
        match &tool.path {
            Some(path) => println!(
                "  {:<14} {}  ({})",
                tool.name,
                path.display(),
                tool.version.as_deref().unwrap_or("unknown version")
            ),
            None => {
                println!("  {:<14} not found", tool.name);
                missing.push(tool.name.as_str());
            }
        }
    }

    if !missing.is_empty() {
        anyhow::bail!("Missing tools: {}", missing.join(", "));
    }
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(config: &Config) {
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!();
    println!("Paths:");
    println!(
        "  Staging:    {}{}",
        config.staging.display(),
        if config.test_mode { "  (test mode)" } else { "" }
    );
    println!("  Library:    {}", config.library.display());
    println!("  Quarantine: {}", config.quarantine_dir().display());
    println!("  Queue file: {}", config.queue_file.display());
    println!("  Logs:       {}", config.log_dir.display());
    println!("  Pattern:    {}", config.file_pattern.as_str());
    println!();
    println!("Presets:");
    for tier in Tier::ALL {
        let p = config.profiles.get(tier);
        let mut line = format!(
            "  {:<7} {} q{} {} {}, audio {} ({} / {})",
            tier.as_str(),
            p.encoder,
            p.quality,
            p.preset,
            p.format,
            p.audio.lang_list,
            p.audio.encoder,
            p.audio.fallback
        );
        if let (Some(w), Some(h)) = (p.max_width, p.max_height) {
            line.push_str(&format!(", max {}x{}", w, h));
        }
        if let Some(ref decomb) = p.decomb {
            line.push_str(&format!(", decomb {}", decomb));
        }
        if let Some(ref deinterlace) = p.deinterlace {
            line.push_str(&format!(", deinterlace {}", deinterlace));
        }
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcode() {
        let cli = Cli::try_parse_from(["reelqueue", "transcode", "/staging/movie.mkv"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Transcode { ref source_file } if source_file == Path::new("/staging/movie.mkv")
        ));
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["reelqueue", "run", "--config", "/etc/reelqueue.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/reelqueue.yaml")));
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn test_missing_positional_is_a_usage_error() {
        assert!(Cli::try_parse_from(["reelqueue", "relocate"]).is_err());
        assert!(Cli::try_parse_from(["reelqueue", "quarantine", "a.mkv", "b.mkv"]).is_err());
    }
}
