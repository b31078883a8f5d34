//! HTTP request handlers for the web server.

mod catalog;
mod files;
mod helpers;
mod operations;
mod pages;
mod static_files;

// Re-export handlers for use by the router
pub use catalog::{load_configs, model_info};
pub use files::{browse_directory, check_status};
pub use operations::{progress, start_delete, start_download};
pub use pages::{health, index};
pub use static_files::{serve_css, serve_js};
