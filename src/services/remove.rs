//! Per-file removal.

use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::models::{DescriptorError, FileDescriptor, FileOutcome, OutcomeStatus};

/// Delete the local copy of one descriptor.
pub async fn remove_file(
    descriptor: &FileDescriptor,
    base_path: &Path,
) -> Result<FileOutcome, DescriptorError> {
    let filename = descriptor.file_name()?;
    let full_path = descriptor.target_dir(base_path).join(&filename);

    if !fs::try_exists(&full_path).await.unwrap_or(false) {
        let message = format!("Skipping file {}...not found!", full_path.display());
        info!("{}", message);
        return Ok(FileOutcome::new(OutcomeStatus::NotFound, filename, message));
    }

    let outcome = match fs::remove_file(&full_path).await {
        Ok(()) => {
            let message = format!("Found file {}...deleted!", full_path.display());
            info!("{}", message);
            FileOutcome::new(OutcomeStatus::Deleted, filename, message)
        }
        Err(e) => {
            let message = format!("Error deleting {}: {}", full_path.display(), e);
            warn!("{}", message);
            FileOutcome::new(OutcomeStatus::Error, filename, message)
        }
    };

    Ok(outcome)
}
