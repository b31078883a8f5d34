//! Progress snapshots for polling clients.

use serde::Serialize;

use super::progress_log::ProgressLog;
use crate::models::{FileOutcome, OperationState, OperationStatus};

/// How many trailing log lines are scanned for a progress line.
const TAIL_LINES: usize = 5;

/// What a poller receives from `/progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub status: OperationStatus,
    pub current: usize,
    pub total: usize,
    pub progress: Vec<FileOutcome>,
    pub current_file: String,
    pub current_progress: String,
}

/// Build a snapshot, enriching the progress line from the log during downloads.
pub async fn progress_snapshot(state: OperationState, log: &ProgressLog) -> ProgressSnapshot {
    let current_progress = live_progress_line(&state, log).await;

    ProgressSnapshot {
        status: state.status,
        current: state.current,
        total: state.total,
        progress: state.progress,
        current_file: state.current_file,
        current_progress,
    }
}

async fn live_progress_line(state: &OperationState, log: &ProgressLog) -> String {
    let current = &state.current_progress;

    // The log is never authoritative for deletes
    if state.status == OperationStatus::Deleting && !current.is_empty() {
        return current.clone();
    }

    // Already qualified with a filename
    if current.contains(':') {
        return current.clone();
    }

    if state.status == OperationStatus::Downloading {
        if let Ok(lines) = log.tail(TAIL_LINES).await {
            if let Some(line) = lines
                .iter()
                .rev()
                .map(|l| l.trim())
                .find(|l| looks_like_progress(l))
            {
                return if state.current_file.is_empty() {
                    line.to_string()
                } else {
                    format!("{}: {}", state.current_file, line)
                };
            }
        }
    }

    current.clone()
}

fn looks_like_progress(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && (line.contains('%') || line.contains("eta") || line.contains("MB/s"))
}
