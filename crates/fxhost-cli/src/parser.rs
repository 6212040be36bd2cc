//! Root CLI parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "fxhost.json";

/// Supervise a FiveM dedicated server.
#[derive(Parser)]
#[command(name = "fxhost")]
#[command(about = "Install, update and supervise a FiveM dedicated server")]
#[command(version)]
pub struct Cli {
    /// Settings file (JSON)
    #[arg(
        short,
        long = "config",
        env = "FXHOST_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        global = true
    )]
    pub config: PathBuf,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
