//! Queue driver.
//!
//! Runs one batch: scan staging, write the checkpoint, then for every
//! queued item transcode and relocate or quarantine, strictly in order.
//! Item failures are logged and recorded; they never stop the batch.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, instrument, warn};

use crate::adapters::Toolchain;
use crate::config::Config;
use crate::domain::{BatchReport, BatchState, ItemOutcome};
use crate::ingest::queue::QueueCheckpoint;
use crate::ingest::scanner::scan_staging;
use crate::ingest::transcoder::{transcode_file, TranscodeOutcome};
use crate::library::{quarantine, relocate};

/// Sequential batch driver
pub struct Driver {
    config: Config,
    tools: Toolchain,
    queue: QueueCheckpoint,
}

impl Driver {
    pub fn new(config: Config, tools: Toolchain) -> Self {
        let queue = QueueCheckpoint::from_config(&config);
        Self {
            config,
            tools,
            queue,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &QueueCheckpoint {
        &self.queue
    }

    /// Scan staging and process everything that was queued.
    ///
    /// Items come from the scan itself; the checkpoint on disk mirrors them
    /// while the batch runs and is removed once every item was attempted.
    #[instrument(skip(self), fields(staging = %self.config.staging.display()))]
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let mut report = BatchReport::new();

        let scan = scan_staging(&self.config, &self.queue)
            .await
            .context("Scan failed")?;
        if scan.is_empty() {
            report.enter(BatchState::Drained);
            return Ok(report);
        }

        report.enter(BatchState::Queued);
        let items = scan.queued;
        info!("Processing {} files from queue", items.len());

        for source in items {
            info!("Processing: {}", source.display());
            let outcome = self.process_item(&source, &mut report).await;
            report.record(source, outcome);
        }

        if let Err(e) = self.queue.clear().await {
            warn!("Failed to remove queue checkpoint: {}", e);
        }
        report.enter(BatchState::Drained);

        info!(
            relocated = report.relocated(),
            quarantined = report.quarantined(),
            needs_attention = report.needs_attention(),
            "Queue processing complete"
        );
        Ok(report)
    }

    /// Transcode one item and route it to the library or quarantine
    async fn process_item(&self, source: &Path, report: &mut BatchReport) -> ItemOutcome {
        report.enter(BatchState::Transcoding);
        let outcome = match transcode_file(source, &self.config.profiles, &self.tools).await {
            Ok(outcome) => outcome,
            Err(e) => TranscodeOutcome::Failed {
                reason: e.to_string(),
            },
        };

        match outcome {
            TranscodeOutcome::Succeeded { output } => {
                info!("Transcode successful: {}", source.display());
                report.enter(BatchState::Relocating);
                match relocate(&output, &self.config.library).await {
                    Ok(destination) => {
                        info!("Move completed: {}", source.display());
                        ItemOutcome::Relocated { destination }
                    }
                    Err(e) => {
                        error!("Move failed: {}: {}", source.display(), e);
                        ItemOutcome::RelocationFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            TranscodeOutcome::Failed { reason } => {
                error!("Transcode failed: {}: {}", source.display(), reason);
                report.enter(BatchState::Quarantining);
                match quarantine(source, &self.config.staging).await {
                    Ok(_) => {
                        info!("Failed file handled: {}", source.display());
                        ItemOutcome::Quarantined
                    }
                    Err(e) => {
                        error!("Failed file handling failed: {}: {}", source.display(), e);
                        ItemOutcome::QuarantineFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("staging", &self.config.staging)
            .field("library", &self.config.library)
            .field("tools", &self.tools)
            .finish()
    }
}
