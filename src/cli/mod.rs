//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// accountd - account registration and activation service
#[derive(Parser)]
#[command(name = "accountd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file; the default search paths are used otherwise
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Write a default config.toml if none exists
    Init,
}
