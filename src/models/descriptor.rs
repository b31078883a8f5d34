//! Remote file descriptors and destination path resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while resolving a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Cannot derive a filename from '{0}'")]
    NoFilename(String),
}

/// One remote file of a model package and where it lands locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub url: String,
    /// Directory relative to the base path.
    #[serde(default)]
    pub directory: String,
    /// Overrides the filename derived from the URL.
    #[serde(default)]
    pub filename: Option<String>,
}

impl FileDescriptor {
    pub fn new(url: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            directory: directory.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// The local filename: the override if set, otherwise the last URL path segment.
    pub fn file_name(&self) -> Result<String, DescriptorError> {
        match self.filename.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => filename_from_url(&self.url),
        }
    }

    /// Directory under `base_path` that holds the file.
    pub fn target_dir(&self, base_path: &Path) -> PathBuf {
        let relative = self.directory.trim_start_matches(['/', '\\']);
        if relative.is_empty() {
            base_path.to_path_buf()
        } else {
            base_path.join(relative)
        }
    }

    /// Full destination path: `base_path/directory/filename`.
    pub fn destination(&self, base_path: &Path) -> Result<PathBuf, DescriptorError> {
        Ok(self.target_dir(base_path).join(self.file_name()?))
    }
}

/// Extract the filename from a URL path, ignoring query string and fragment.
pub fn filename_from_url(raw: &str) -> Result<String, DescriptorError> {
    let parsed = Url::parse(raw).map_err(|e| DescriptorError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .ok_or_else(|| DescriptorError::NoFilename(raw.to_string()))
}
