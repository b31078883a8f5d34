//! Shared utility functions.

mod format;

pub use format::{format_size, truncate_middle};
