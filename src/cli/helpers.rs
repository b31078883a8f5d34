//! Shared helper functions for CLI commands.

use std::path::PathBuf;

use anyhow::Context;

use model_manager::config::Settings;
use model_manager::models::ModelPackage;
use model_manager::services::CatalogStore;

/// Fetch the catalog from the configured source.
pub async fn load_catalog(settings: &Settings) -> anyhow::Result<CatalogStore> {
    let catalog = settings.create_catalog()?;
    catalog
        .refresh()
        .await
        .with_context(|| format!("Failed to load model configurations from {}", catalog.source()))?;
    Ok(catalog)
}

/// Look up a package by name, suggesting close matches when missing.
pub async fn find_package(catalog: &CatalogStore, name: &str) -> anyhow::Result<ModelPackage> {
    if let Some(package) = catalog.get(name).await {
        return Ok(package);
    }

    let needle = name.to_lowercase();
    let similar: Vec<String> = catalog
        .names()
        .await
        .into_iter()
        .filter(|n| n.to_lowercase().contains(&needle))
        .collect();

    if similar.is_empty() {
        anyhow::bail!("Unknown model package '{}'. Run 'model-manager list'.", name)
    } else {
        anyhow::bail!(
            "Unknown model package '{}'. Did you mean: {}?",
            name,
            similar.join(", ")
        )
    }
}

/// Base path from the command line, or the configured default.
pub fn resolve_base_path(settings: &Settings, base_path: Option<PathBuf>) -> PathBuf {
    match base_path {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref()),
        None => settings.base_path.clone(),
    }
}
