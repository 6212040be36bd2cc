//! `config` handler: manage the settings file.

use std::path::Path;

use anyhow::{Result, bail};
use fxhost_core::Settings;

use crate::bootstrap::load_settings;
use crate::commands::ConfigCommand;
use crate::error::CliError;

/// Execute a config subcommand against the file at `path`.
///
/// Runs without a full bootstrap so a broken file can still be inspected
/// and replaced.
pub fn execute(path: &Path, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => init(path, force),
        ConfigCommand::Show => show(path),
        ConfigCommand::Path => {
            let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
            println!("{}", absolute.display());
            Ok(())
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Settings::default().save(path).map_err(CliError::from)?;
    println!("✓ Wrote default settings to {}", path.display());
    Ok(())
}

fn show(path: &Path) -> Result<()> {
    let settings = load_settings(path)?;
    let json = serde_json::to_string_pretty(&settings)?;
    println!("{json}");
    Ok(())
}
