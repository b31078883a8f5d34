//! Download and delete commands.

use std::io::{self, Write};
use std::path::PathBuf;

use console::style;

use model_manager::config::Settings;
use model_manager::models::{OperationStatus, OutcomeStatus};
use model_manager::services::ProgressSnapshot;

use crate::cli::helpers::{find_package, load_catalog, resolve_base_path};
use crate::cli::progress::follow_batch;

/// Download every file of a package, skipping files already present.
pub async fn cmd_download(
    settings: &Settings,
    model: &str,
    base_path: Option<PathBuf>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let catalog = load_catalog(settings).await?;
    let package = find_package(&catalog, model).await?;
    let base_path = resolve_base_path(settings, base_path);

    let downloader = settings.downloader();
    if !downloader.is_available() {
        anyhow::bail!(
            "Downloader '{}' not found. Install it or set MODEL_MANAGER_DOWNLOADER.",
            downloader.program()
        );
    }

    println!(
        "{} Downloading {} ({} files) to {}",
        style("→").cyan(),
        style(model).bold(),
        package.files.len(),
        base_path.display()
    );

    let coordinator = settings.create_coordinator();
    let handle = coordinator
        .start_package_download(model, &package, base_path, token)
        .await?;

    let snapshot = follow_batch(&coordinator, handle).await?;
    finish(snapshot)
}

/// Delete every file of a package.
pub async fn cmd_delete(
    settings: &Settings,
    model: &str,
    base_path: Option<PathBuf>,
    yes: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(settings).await?;
    let package = find_package(&catalog, model).await?;
    let base_path = resolve_base_path(settings, base_path);

    if !yes {
        print!(
            "Delete {} file(s) of {} from {}? [y/N] ",
            package.files.len(),
            model,
            base_path.display()
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!(
        "{} Deleting {} from {}",
        style("→").cyan(),
        style(model).bold(),
        base_path.display()
    );

    let coordinator = settings.create_coordinator();
    let handle = coordinator.start_package_delete(&package, base_path).await?;

    let snapshot = follow_batch(&coordinator, handle).await?;
    finish(snapshot)
}

fn finish(snapshot: ProgressSnapshot) -> anyhow::Result<()> {
    if snapshot.status == OperationStatus::Error {
        anyhow::bail!("{}", snapshot.current_progress);
    }

    let errors = snapshot
        .progress
        .iter()
        .filter(|o| o.status == OutcomeStatus::Error)
        .count();

    if errors > 0 {
        println!("{} {}", style("!").yellow(), snapshot.current_progress);
        anyhow::bail!("{} file(s) failed", errors);
    }

    println!("{} {}", style("✓").green(), snapshot.current_progress);
    Ok(())
}
