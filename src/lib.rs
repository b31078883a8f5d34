//! Model Manager - download and manage model packages for ComfyUI.
//!
//! A catalog of named packages maps to files on remote hosts. Batches of
//! downloads or deletions run in the background while clients poll a single
//! shared progress snapshot.

pub mod config;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;
