//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "trellis-manage")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect the app registry of a trellis project")]
pub struct Cli {
    /// Settings file. Defaults to `TRELLIS_SETTINGS`, then `settings.toml` in the working directory
    #[arg(short, long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Populate the registry and report unresolved model references
    Check {},
    /// List installed applications
    Apps {},
    /// List registered models
    Models {
        /// Include auto-created and swapped models
        #[arg(short, long)]
        all: bool,
        /// Only models of this app label
        #[arg(long, value_name = "LABEL")]
        app: Option<String>,
    },
    /// Show one model, given as `app_label.ModelName`
    Model { reference: String },
}
