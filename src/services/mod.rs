//! Service layer for model package management.
//!
//! This module contains domain logic separated from UI concerns.
//! Services can be used by the CLI, the web server, or other interfaces.

pub mod catalog;
pub mod coordinator;
pub mod inventory;
pub mod progress_log;
pub mod remove;
pub mod reporter;
pub mod transfer;

pub use catalog::{CatalogError, CatalogStore};
pub use coordinator::{CoordinatorError, OperationCoordinator};
pub use inventory::{browse_directory, check_package, BrowseError, DirEntry, PackageStatus};
pub use progress_log::ProgressLog;
pub use remove::remove_file;
pub use reporter::ProgressSnapshot;
pub use transfer::{transfer_file, Downloader, TransferError, WgetDownloader};
