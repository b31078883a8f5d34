//! Data models for the model manager.

mod descriptor;
mod operation;
mod package;

pub use descriptor::{filename_from_url, DescriptorError, FileDescriptor};
pub use operation::{BatchKind, FileOutcome, OperationState, OperationStatus, OutcomeStatus};
pub use package::{Catalog, ModelPackage};
