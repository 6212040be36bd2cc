//! Subcommands of the `fxhost` binary.

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Install or update the server, start it and attach to its console
    ///
    /// Lines typed on stdin are sent as server console commands. `/stop`,
    /// `/restart`, `/update` and `/kill` control the supervisor instead.
    /// Ctrl+C stops the server and exits.
    Run,

    /// Download and install the newest server build
    Update,

    /// Download and install the baseline server-data set
    UpdateData,

    /// Print the launch directives the server would be started with
    Args,

    /// Show installation status and the newest published build
    Status,

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Settings file commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective settings as JSON
    Show,
    /// Print the settings file location
    Path,
}
