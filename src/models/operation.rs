//! Batch operation state shared between the worker and pollers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a single file within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Skipped,
    Downloading,
    Success,
    Error,
    Deleting,
    Deleted,
    NotFound,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Downloading => "downloading",
            Self::Success => "success",
            Self::Error => "error",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::NotFound => "not_found",
        }
    }

    /// Placeholder for a file whose transfer or removal has not returned.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Downloading | Self::Deleting)
    }
}

/// Result entry for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub status: OutcomeStatus,
    pub file: String,
    pub message: String,
}

impl FileOutcome {
    pub fn new(status: OutcomeStatus, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            file: file.into(),
            message: message.into(),
        }
    }
}

/// What the coordinator is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Idle,
    Downloading,
    Deleting,
    Error,
}

impl OperationStatus {
    /// Whether a batch is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Downloading | Self::Deleting)
    }
}

/// Kind of batch being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Download,
    Delete,
}

impl BatchKind {
    pub fn status(&self) -> OperationStatus {
        match self {
            Self::Download => OperationStatus::Downloading,
            Self::Delete => OperationStatus::Deleting,
        }
    }
}

/// Progress record of the current (or last) batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationState {
    pub status: OperationStatus,
    pub total: usize,
    /// Files started so far; equals `total` once the batch finishes.
    pub current: usize,
    pub current_file: String,
    pub current_progress: String,
    pub progress: Vec<FileOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl OperationState {
    /// Fresh state for a batch of `total` files.
    pub fn begin(kind: BatchKind, total: usize) -> Self {
        let current_progress = match kind {
            BatchKind::Download => String::new(),
            BatchKind::Delete => "Preparing to delete files...".to_string(),
        };

        Self {
            status: kind.status(),
            total,
            current_progress,
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Number of outcomes with the given status.
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.progress.iter().filter(|o| o.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_snake_case() {
        let outcome = FileOutcome::new(OutcomeStatus::NotFound, "a.bin", "missing");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["file"], "a.bin");
        assert_eq!(OutcomeStatus::NotFound.as_str(), "not_found");
        assert!(OutcomeStatus::Deleting.is_pending());
        assert!(!OutcomeStatus::Deleted.is_pending());
    }

    #[test]
    fn test_begin_resets_fields() {
        let state = OperationState::begin(BatchKind::Delete, 3);
        assert_eq!(state.status, OperationStatus::Deleting);
        assert_eq!(state.total, 3);
        assert_eq!(state.current, 0);
        assert!(state.progress.is_empty());
        assert_eq!(state.current_progress, "Preparing to delete files...");
        assert!(state.started_at.is_some());
        assert!(state.finished_at.is_none());
        assert!(state.status.is_running());
    }

    #[test]
    fn test_idle_is_default() {
        let state = OperationState::default();
        assert_eq!(state.status, OperationStatus::Idle);
        assert!(!state.status.is_running());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "idle");
        assert!(json.get("started_at").is_none());
    }
}
