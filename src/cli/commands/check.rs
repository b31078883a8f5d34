//! Local status command.

use std::path::PathBuf;

use console::style;

use model_manager::config::Settings;
use model_manager::services::check_package;
use model_manager::utils::format_size;

use crate::cli::helpers::{find_package, load_catalog, resolve_base_path};

/// Report which files of a package exist under the base path.
pub async fn cmd_check(
    settings: &Settings,
    model: &str,
    base_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let catalog = load_catalog(settings).await?;
    let package = find_package(&catalog, model).await?;
    let base_path = resolve_base_path(settings, base_path);

    let status = check_package(&package.files, &base_path).await;

    println!(
        "\n{} in {}",
        style(model).bold(),
        style(base_path.display()).dim()
    );
    println!("{}", "-".repeat(60));

    for file in &status.file_status {
        if file.exists {
            let size = tokio::fs::metadata(&file.path)
                .await
                .map(|m| format_size(m.len()))
                .unwrap_or_default();
            println!("  {} {} {}", style("✓").green(), file.path, style(size).dim());
        } else {
            println!("  {} {}", style("✗").red(), file.path);
        }
    }

    let summary = format!("{}/{} file(s) present", status.found, status.total);
    if status.found == status.total {
        println!("\n{} {}", style("✓").green(), summary);
    } else {
        println!("\n{} {}", style("!").yellow(), summary);
    }

    Ok(())
}
