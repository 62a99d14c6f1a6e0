//! Batch state and the per-item outcomes of a queue run.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Where a batch is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Looking for new files in staging
    Scanning,

    /// Checkpoint written, items waiting
    Queued,

    /// Encoder running for the current item
    Transcoding,

    /// Moving a finished transcode into the library
    Relocating,

    /// Moving a failed item into quarantine
    Quarantining,

    /// Every item attempted, checkpoint removed
    Drained,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchState::Scanning => "scanning",
            BatchState::Queued => "queued",
            BatchState::Transcoding => "transcoding",
            BatchState::Relocating => "relocating",
            BatchState::Quarantining => "quarantining",
            BatchState::Drained => "drained",
        };
        f.write_str(s)
    }
}

/// Final outcome for one queued item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Transcoded and moved into the library
    Relocated { destination: PathBuf },

    /// Transcoded, but the move into the library failed
    RelocationFailed { error: String },

    /// Transcode failed, files moved to quarantine
    Quarantined,

    /// Transcode failed and quarantine failed too
    QuarantineFailed { error: String },
}

impl ItemOutcome {
    pub fn is_relocated(&self) -> bool {
        matches!(self, Self::Relocated { .. })
    }

    pub fn is_quarantined(&self) -> bool {
        matches!(self, Self::Quarantined)
    }

    /// Whether the item ended in an error that needs a human
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            Self::RelocationFailed { .. } | Self::QuarantineFailed { .. }
        )
    }
}

/// Summary of one driver run
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub state: BatchState,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Items in queue order with their outcome
    pub items: Vec<(PathBuf, ItemOutcome)>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            state: BatchState::Scanning,
            started_at: Utc::now(),
            completed_at: None,
            items: Vec::new(),
        }
    }

    /// Record the transition into `state`
    pub fn enter(&mut self, state: BatchState) {
        tracing::debug!(from = %self.state, to = %state, "Batch state change");
        self.state = state;
        if state == BatchState::Drained {
            self.completed_at = Some(Utc::now());
        }
    }

    pub fn record(&mut self, source: PathBuf, outcome: ItemOutcome) {
        self.items.push((source, outcome));
    }

    pub fn relocated(&self) -> usize {
        self.items.iter().filter(|(_, o)| o.is_relocated()).count()
    }

    pub fn quarantined(&self) -> usize {
        self.items.iter().filter(|(_, o)| o.is_quarantined()).count()
    }

    pub fn needs_attention(&self) -> usize {
        self.items.iter().filter(|(_, o)| o.needs_attention()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::new();
        report.enter(BatchState::Queued);
        report.record(
            PathBuf::from("/staging/a.mkv"),
            ItemOutcome::Relocated {
                destination: PathBuf::from("/plex/a.mkv"),
            },
        );
        report.record(PathBuf::from("/staging/b.mkv"), ItemOutcome::Quarantined);
        report.record(
            PathBuf::from("/staging/c.mkv"),
            ItemOutcome::QuarantineFailed {
                error: "Source file not found".to_string(),
            },
        );

        assert_eq!(report.relocated(), 1);
        assert_eq!(report.quarantined(), 1);
        assert_eq!(report.needs_attention(), 1);
        assert!(report.completed_at.is_none());
    }

    #[test]
    fn test_drained_sets_completion_time() {
        let mut report = BatchReport::new();
        assert_eq!(report.state, BatchState::Scanning);
        report.enter(BatchState::Drained);
        assert_eq!(report.state, BatchState::Drained);
        assert!(report.completed_at.is_some());
        assert!(report.is_empty());
    }
}
