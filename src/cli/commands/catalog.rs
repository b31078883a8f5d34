//! Catalog commands.

use console::style;

use model_manager::config::Settings;
use model_manager::utils::truncate_middle;

use crate::cli::helpers::{find_package, load_catalog};

/// List the packages in the catalog.
pub async fn cmd_list(settings: &Settings) -> anyhow::Result<()> {
    let catalog = load_catalog(settings).await?;

    if catalog.is_empty().await {
        println!("{} The catalog has no model packages.", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Model Packages").bold());
    println!("{}", "-".repeat(60));
    println!("{:<45} {:>6}  Token", "Name", "Files");
    println!("{}", "-".repeat(60));

    for name in catalog.names().await {
        let Some(package) = catalog.get(&name).await else {
            continue;
        };
        let token = if package.hf {
            style("required").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{:<45} {:>6}  {}",
            truncate_middle(&name, 44),
            package.files.len(),
            token
        );
    }

    println!("\n{} package(s)", catalog.len().await);
    Ok(())
}

/// Show the files of one package.
pub async fn cmd_info(settings: &Settings, model: &str) -> anyhow::Result<()> {
    let catalog = load_catalog(settings).await?;
    let package = find_package(&catalog, model).await?;

    println!("\n{}", style(model).bold());
    if package.hf {
        println!(
            "  {} Requires a Hugging Face token (--token or HF_TOKEN)",
            style("!").yellow()
        );
    }
    println!("{}", "-".repeat(60));

    for descriptor in &package.files {
        let filename = match descriptor.file_name() {
            Ok(name) => name,
            Err(e) => style(e.to_string()).red().to_string(),
        };
        println!("  {:<24} {}", descriptor.directory, filename);
        println!("  {:<24} {}", "", style(&descriptor.url).dim());
    }

    println!("\n{} file(s)", package.files.len());
    Ok(())
}
