//! Read-only views of the local model directories.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::FileDescriptor;

/// Maximum children listed for each sub-directory.
pub const MAX_CHILDREN: usize = 50;

/// Presence of one package file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub path: String,
    pub exists: bool,
    pub filename: String,
    pub directory: String,
}

/// Presence of every file of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStatus {
    pub total: usize,
    pub found: usize,
    pub file_status: Vec<FileStatus>,
}

/// Check which files of a package exist under `base_path`.
///
/// A descriptor without a usable filename is reported as missing, with its
/// target directory as the path and the URL as the filename.
pub async fn check_package(files: &[FileDescriptor], base_path: &Path) -> PackageStatus {
    let mut file_status = Vec::with_capacity(files.len());

    for descriptor in files {
        let target_dir = descriptor.target_dir(base_path);
        let (filename, path, exists) = match descriptor.file_name() {
            Ok(filename) => {
                let path = target_dir.join(&filename);
                let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
                (filename, path, exists)
            }
            Err(e) => {
                warn!("Cannot check {}: {}", descriptor.url, e);
                (descriptor.url.clone(), target_dir, false)
            }
        };
        file_status.push(FileStatus {
            path: path.to_string_lossy().to_string(),
            exists,
            filename,
            directory: descriptor.directory.clone(),
        });
    }

    PackageStatus {
        total: files.len(),
        found: file_status.iter().filter(|f| f.exists).count(),
        file_status,
    }
}

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("No path provided")]
    EmptyPath,
    #[error("Path does not exist")]
    NotFound,
    #[error("Path is not a directory")]
    NotADirectory,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Error reading directory: {0}")]
    Io(io::Error),
}

impl From<io::Error> for BrowseError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::PermissionDenied => BrowseError::PermissionDenied,
            io::ErrorKind::NotFound => BrowseError::NotFound,
            _ => BrowseError::Io(e),
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirEntry {
    Folder { name: String, children: Vec<DirEntry> },
    File { name: String, size: u64 },
}

impl DirEntry {
    pub fn name(&self) -> &str {
        match self {
            DirEntry::Folder { name, .. } | DirEntry::File { name, .. } => name,
        }
    }
}

/// List `path` two levels deep: sub-directories carry their own sorted
/// children (at most [`MAX_CHILDREN`]), whose folders are left unexpanded.
pub async fn browse_directory(path: &str) -> Result<Vec<DirEntry>, BrowseError> {
    if path.trim().is_empty() {
        return Err(BrowseError::EmptyPath);
    }

    let root = PathBuf::from(shellexpand::tilde(path).as_ref());
    let meta = tokio::fs::metadata(&root).await?;
    if !meta.is_dir() {
        return Err(BrowseError::NotADirectory);
    }

    let mut structure = Vec::new();
    for (name, item_path, is_dir) in sorted_entries(&root).await? {
        if is_dir {
            let children = match list_children(&item_path).await {
                Ok(children) => children,
                Err(_) => vec![DirEntry::File {
                    name: "Permission denied".to_string(),
                    size: 0,
                }],
            };
            structure.push(DirEntry::Folder { name, children });
        } else {
            structure.push(DirEntry::File {
                size: file_size(&item_path).await,
                name,
            });
        }
    }

    Ok(structure)
}

async fn list_children(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut children = Vec::new();
    for (name, path, is_dir) in sorted_entries(dir).await?.into_iter().take(MAX_CHILDREN) {
        if is_dir {
            children.push(DirEntry::Folder {
                name,
                children: Vec::new(),
            });
        } else {
            children.push(DirEntry::File {
                size: file_size(&path).await,
                name,
            });
        }
    }
    Ok(children)
}

async fn sorted_entries(dir: &Path) -> io::Result<Vec<(String, PathBuf, bool)>> {
    let mut entries = Vec::new();
    let mut reader = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let path = entry.path();
        // Follow symlinks when deciding folder vs file
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().to_string(), path, is_dir));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

async fn file_size(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}
