//! Terminal progress for background batches.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;

use model_manager::models::{FileOutcome, OperationStatus, OutcomeStatus};
use model_manager::services::{OperationCoordinator, ProgressSnapshot};
use model_manager::utils::truncate_middle;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Follow a running batch until its worker exits, printing each finished file.
pub async fn follow_batch(
    coordinator: &OperationCoordinator,
    handle: JoinHandle<()>,
) -> anyhow::Result<ProgressSnapshot> {
    let total = coordinator.state().await.total;

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut printed = 0;
    loop {
        let finished = handle.is_finished();
        let snapshot = coordinator.snapshot().await;

        if snapshot.status != OperationStatus::Error {
            // Everything before the in-flight placeholder is final
            for outcome in snapshot
                .progress
                .iter()
                .skip(printed)
                .take_while(|o| !o.status.is_pending())
            {
                pb.println(outcome_line(outcome));
                printed += 1;
            }
            pb.set_position(printed as u64);
            pb.set_message(truncate_middle(&snapshot.current_progress, 80));
        }

        if finished {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    handle.await?;
    pb.finish_and_clear();

    Ok(coordinator.snapshot().await)
}

fn outcome_line(outcome: &FileOutcome) -> String {
    let marker = match outcome.status {
        OutcomeStatus::Success | OutcomeStatus::Deleted => style("✓").green(),
        OutcomeStatus::Skipped | OutcomeStatus::NotFound => style("-").dim(),
        OutcomeStatus::Error => style("✗").red(),
        OutcomeStatus::Downloading | OutcomeStatus::Deleting => style("…").cyan(),
    };
    format!("  {} {}", marker, outcome.message)
}
