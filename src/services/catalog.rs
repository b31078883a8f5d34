//! Model package catalog fetched from a remote JSON document.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::{Catalog, ModelPackage};

/// Timeout for fetching the catalog.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("model-manager/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] io::Error),
}

/// Last successfully loaded catalog plus where to refresh it from.
///
/// A failed refresh keeps the previous catalog, so the server keeps
/// working with whatever it had (possibly nothing) until the next refresh.
#[derive(Clone)]
pub struct CatalogStore {
    source: String,
    client: Client,
    catalog: Arc<RwLock<Catalog>>,
}

impl CatalogStore {
    /// Create an empty store. `source` is an `http(s)://` URL or a local JSON path.
    pub fn new(source: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            source: source.into(),
            client,
            catalog: Arc::new(RwLock::new(Catalog::new())),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Load the catalog from the source without storing it.
    pub async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let body = if is_remote(&self.source) {
            self.client
                .get(&self.source)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?
        } else {
            let path = PathBuf::from(shellexpand::tilde(&self.source).as_ref());
            tokio::fs::read_to_string(&path).await?
        };

        Ok(serde_json::from_str(&body)?)
    }

    /// Reload from the source. Returns the number of packages on success.
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        info!("Loading model configurations from: {}", self.source);

        match self.fetch().await {
            Ok(catalog) => {
                let count = catalog.len();
                *self.catalog.write().await = catalog;
                info!("Loaded {} model configurations", count);
                Ok(count)
            }
            Err(e) => {
                warn!("Error loading model configurations: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the catalog directly.
    pub async fn set(&self, catalog: Catalog) {
        *self.catalog.write().await = catalog;
    }

    pub async fn get(&self, name: &str) -> Option<ModelPackage> {
        self.catalog.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.catalog.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.catalog.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.catalog.read().await.is_empty()
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
