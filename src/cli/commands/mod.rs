//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod batch;
mod catalog;
mod check;
mod serve;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use model_manager::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "model-manager")]
#[command(about = "Download and manage model packages for ComfyUI")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web interface
    Serve {
        /// Address to bind: port, host, or host:port [default: 0.0.0.0:9999]
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List the model packages in the catalog
    List,

    /// Show the files of a model package
    Info {
        /// Package name as listed by `list`
        model: String,
    },

    /// Check which files of a package exist locally
    Check {
        /// Package name
        model: String,
        /// Models directory (defaults to the configured base path)
        #[arg(short, long)]
        base_path: Option<PathBuf>,
    },

    /// Download every file of a package
    Download {
        /// Package name
        model: String,
        /// Models directory (defaults to the configured base path)
        #[arg(short, long)]
        base_path: Option<PathBuf>,
        /// Hugging Face token for gated packages
        #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Delete every file of a package
    Delete {
        /// Package name
        model: String,
        /// Models directory (defaults to the configured base path)
        #[arg(short, long)]
        base_path: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (settings, _config) = load_settings_with_options(options)
        .await
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::List => catalog::cmd_list(&settings).await,
        Commands::Info { model } => catalog::cmd_info(&settings, &model).await,
        Commands::Check { model, base_path } => {
            check::cmd_check(&settings, &model, base_path).await
        }
        Commands::Download {
            model,
            base_path,
            token,
        } => batch::cmd_download(&settings, &model, base_path, token).await,
        Commands::Delete {
            model,
            base_path,
            yes,
        } => batch::cmd_delete(&settings, &model, base_path, yes).await,
    }
}
