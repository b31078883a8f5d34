//! Model packages as published in the remote catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FileDescriptor;

/// A named set of files that are downloaded or removed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPackage {
    pub files: Vec<FileDescriptor>,
    /// Whether a Hugging Face token is required to download.
    #[serde(default)]
    pub hf: bool,
}

/// Package name to package, ordered by name.
pub type Catalog = BTreeMap<String, ModelPackage>;
