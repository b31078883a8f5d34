//! Batch coordination over the shared operation state.
//!
//! One coordinator owns the single [`OperationState`] slot. Starting a batch
//! resets the slot and spawns one worker task that processes the files
//! strictly in order, updating the slot after every step. Pollers read
//! clones of the slot through [`OperationCoordinator::snapshot`] while the
//! worker runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::progress_log::ProgressLog;
use super::remove::remove_file;
use super::reporter::{progress_snapshot, ProgressSnapshot};
use super::transfer::{transfer_file, Downloader};
use crate::models::{
    BatchKind, DescriptorError, FileDescriptor, FileOutcome, ModelPackage, OperationState,
    OperationStatus, OutcomeStatus,
};

/// Pause after each file so pollers can observe intermediate state.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

/// Reasons a batch is refused before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("Another operation is already running ({current}/{total} files)")]
    Busy { current: usize, total: usize },
    #[error("Hugging Face token is required for {0}. Please provide your HF token and try again.")]
    TokenRequired(String),
    #[error("Invalid model selection")]
    EmptyBatch,
}

/// Runs download and delete batches one at a time.
#[derive(Clone)]
pub struct OperationCoordinator {
    state: Arc<RwLock<OperationState>>,
    downloader: Arc<dyn Downloader>,
    log: ProgressLog,
    step_delay: Duration,
}

impl OperationCoordinator {
    pub fn new(downloader: Arc<dyn Downloader>, log: ProgressLog) -> Self {
        Self {
            state: Arc::new(RwLock::new(OperationState::default())),
            downloader,
            log,
            step_delay: DEFAULT_STEP_DELAY,
        }
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    pub fn log(&self) -> &ProgressLog {
        &self.log
    }

    /// Copy of the authoritative state.
    pub async fn state(&self) -> OperationState {
        self.state.read().await.clone()
    }

    /// State as shown to pollers, with the live progress line enriched.
    pub async fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state().await;
        progress_snapshot(state, &self.log).await
    }

    /// Download every file of a package, checking the token requirement first.
    pub async fn start_package_download(
        &self,
        name: &str,
        package: &ModelPackage,
        base_path: PathBuf,
        token: Option<String>,
    ) -> Result<JoinHandle<()>, CoordinatorError> {
        let token = normalize_token(token);
        if package.hf && token.is_none() {
            return Err(CoordinatorError::TokenRequired(name.to_string()));
        }
        self.start_download(package.files.clone(), base_path, token)
            .await
    }

    /// Delete every file of a package.
    pub async fn start_package_delete(
        &self,
        package: &ModelPackage,
        base_path: PathBuf,
    ) -> Result<JoinHandle<()>, CoordinatorError> {
        self.start_delete(package.files.clone(), base_path).await
    }

    /// Start a download batch. Returns the worker handle.
    pub async fn start_download(
        &self,
        files: Vec<FileDescriptor>,
        base_path: PathBuf,
        token: Option<String>,
    ) -> Result<JoinHandle<()>, CoordinatorError> {
        self.begin(BatchKind::Download, files.len()).await?;
        Ok(self.spawn_batch(BatchKind::Download, files, base_path, normalize_token(token)))
    }

    /// Start a delete batch. Returns the worker handle.
    pub async fn start_delete(
        &self,
        files: Vec<FileDescriptor>,
        base_path: PathBuf,
    ) -> Result<JoinHandle<()>, CoordinatorError> {
        self.begin(BatchKind::Delete, files.len()).await?;
        Ok(self.spawn_batch(BatchKind::Delete, files, base_path, None))
    }

    /// Claim the slot for a new batch.
    async fn begin(&self, kind: BatchKind, total: usize) -> Result<(), CoordinatorError> {
        if total == 0 {
            return Err(CoordinatorError::EmptyBatch);
        }

        let mut state = self.state.write().await;
        if state.status.is_running() {
            return Err(CoordinatorError::Busy {
                current: state.current,
                total: state.total,
            });
        }
        *state = OperationState::begin(kind, total);
        Ok(())
    }

    fn spawn_batch(
        &self,
        kind: BatchKind,
        files: Vec<FileDescriptor>,
        base_path: PathBuf,
        token: Option<String>,
    ) -> JoinHandle<()> {
        let supervisor = self.clone();
        let worker = self.clone();

        tokio::spawn(async move {
            // Run the loop in its own task so a panic lands here as a JoinError
            let result =
                tokio::spawn(async move { worker.run_batch(kind, files, base_path, token).await })
                    .await;

            let failure = match result {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(e.to_string()),
            };

            if let Some(reason) = failure {
                supervisor.fail(kind, &reason).await;
            }
        })
    }

    async fn run_batch(
        &self,
        kind: BatchKind,
        files: Vec<FileDescriptor>,
        base_path: PathBuf,
        token: Option<String>,
    ) -> Result<(), DescriptorError> {
        let total = files.len();
        info!(
            "Starting {} of {} file(s) under {}",
            kind_label(kind),
            total,
            base_path.display()
        );

        if kind == BatchKind::Delete {
            if let Err(e) = self.log.write_marker("Starting file deletion...").await {
                debug!("Could not reset progress log: {}", e);
            }
        }

        for (index, descriptor) in files.iter().enumerate() {
            let filename = descriptor.file_name()?;
            self.begin_file(kind, index, &filename).await;

            let outcome = match kind {
                BatchKind::Download => {
                    transfer_file(
                        descriptor,
                        &base_path,
                        token.as_deref(),
                        self.downloader.as_ref(),
                        &self.log,
                    )
                    .await?
                }
                BatchKind::Delete => remove_file(descriptor, &base_path).await?,
            };

            let entry = FileOutcome::new(
                outcome.status,
                &filename,
                result_message(kind, &filename, &outcome),
            );

            {
                let mut state = self.state.write().await;
                // Overwrite the placeholder pushed by begin_file
                match state.progress.last_mut() {
                    Some(last) if last.status.is_pending() => *last = entry,
                    _ => state.progress.push(entry),
                }
                state.current_progress = file_progress(kind, &filename, outcome.status);
            }

            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
        }

        let summary = {
            let mut state = self.state.write().await;
            state.current = total;
            state.status = OperationStatus::Idle;
            state.finished_at = Some(Utc::now());
            state.current_progress = batch_summary(kind, &state);
            state.current_progress.clone()
        };

        info!("{}", summary);
        Ok(())
    }

    /// Mark file `index` as started: advance `current` and push an in-progress
    /// entry, so `progress.len() == current` while the file is processed.
    async fn begin_file(&self, kind: BatchKind, index: usize, filename: &str) {
        let (status, current_progress, message) = match kind {
            BatchKind::Download => (
                OutcomeStatus::Downloading,
                format!("Starting download of {}...", filename),
                format!("Starting download: {}", filename),
            ),
            BatchKind::Delete => (
                OutcomeStatus::Deleting,
                format!("Checking {}...", filename),
                format!("Deleting: {}", filename),
            ),
        };

        let mut state = self.state.write().await;
        state.current_file = filename.to_string();
        state.current = index + 1;
        state.current_progress = current_progress;
        state.progress.push(FileOutcome::new(status, filename, message));
    }

    /// Record a failure of the batch loop itself.
    async fn fail(&self, kind: BatchKind, reason: &str) {
        let message = match kind {
            BatchKind::Download => format!("Download failed: {}", reason),
            BatchKind::Delete => format!("Deletion failed: {}", reason),
        };
        warn!("{}", message);

        let mut state = self.state.write().await;
        state.status = OperationStatus::Error;
        state.progress = vec![FileOutcome::new(OutcomeStatus::Error, "unknown", &message)];
        state.current_progress = message;
        state.finished_at = Some(Utc::now());
    }
}

fn normalize_token(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn kind_label(kind: BatchKind) -> &'static str {
    match kind {
        BatchKind::Download => "download",
        BatchKind::Delete => "deletion",
    }
}

/// Message stored in the progress list for a finished file.
fn result_message(kind: BatchKind, filename: &str, outcome: &FileOutcome) -> String {
    match (kind, outcome.status) {
        (BatchKind::Download, OutcomeStatus::Success) => {
            format!("Successfully downloaded: {}", filename)
        }
        (BatchKind::Download, OutcomeStatus::Skipped) => {
            format!("File already exists: {}", filename)
        }
        (BatchKind::Download, _) => {
            format!("Failed to download: {} - {}", filename, outcome.message)
        }
        (BatchKind::Delete, OutcomeStatus::Deleted) => format!("Successfully deleted: {}", filename),
        (BatchKind::Delete, OutcomeStatus::NotFound) => format!("File not found: {}", filename),
        (BatchKind::Delete, _) => format!("Failed to delete: {} - {}", filename, outcome.message),
    }
}

/// Short status line after a file finishes.
fn file_progress(kind: BatchKind, filename: &str, status: OutcomeStatus) -> String {
    match (kind, status) {
        (BatchKind::Download, OutcomeStatus::Success) => format!("{}: Download completed", filename),
        (BatchKind::Download, OutcomeStatus::Skipped) => {
            format!("{}: File already exists", filename)
        }
        (BatchKind::Download, _) => format!("{}: Download failed", filename),
        (BatchKind::Delete, OutcomeStatus::Deleted) => format!("{}: Deleted successfully", filename),
        (BatchKind::Delete, OutcomeStatus::NotFound) => format!("{}: File not found", filename),
        (BatchKind::Delete, _) => format!("{}: Deletion failed", filename),
    }
}

/// Aggregate message for a finished batch.
fn batch_summary(kind: BatchKind, state: &OperationState) -> String {
    let errors = state.count(OutcomeStatus::Error);

    match kind {
        BatchKind::Download => {
            let downloaded = state.count(OutcomeStatus::Success);
            let skipped = state.count(OutcomeStatus::Skipped);
            if errors > 0 {
                format!(
                    "Completed with {} errors, {} downloaded, {} already existed",
                    errors, downloaded, skipped
                )
            } else if skipped > 0 {
                format!(
                    "Completed: {} downloaded, {} file(s) already existed",
                    downloaded, skipped
                )
            } else {
                format!("{} file(s) downloaded successfully", downloaded)
            }
        }
        BatchKind::Delete => {
            let deleted = state.count(OutcomeStatus::Deleted);
            let not_found = state.count(OutcomeStatus::NotFound);
            if errors > 0 {
                format!(
                    "Deletion completed with {} errors, {} deleted, {} not found",
                    errors, deleted, not_found
                )
            } else if not_found > 0 {
                format!(
                    "Deletion completed: {} deleted, {} files were not found",
                    deleted, not_found
                )
            } else {
                format!("All {} files deleted successfully", deleted)
            }
        }
    }
}
