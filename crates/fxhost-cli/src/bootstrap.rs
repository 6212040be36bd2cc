//! CLI bootstrap, the composition root.
//!
//! Settings are loaded and validated here, and the concrete adapters are
//! wired into a [`ServerSupervisor`]: the HTTP update pipeline with terminal
//! progress bars, the UDP RCON channel, random per-launch secrets and an
//! event broadcaster the `run` handler subscribes to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fxhost_core::{Settings, SupportedOs, validate_settings};
use fxhost_runtime::{
    CliProgress, ServerSupervisor, SupervisorDeps, SupervisorEventBroadcaster, UpdatePipeline,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Fully composed context handed to command handlers.
pub struct CliContext {
    /// Settings file the context was loaded from.
    pub config_path: PathBuf,
    pub platform: SupportedOs,
    pub supervisor: ServerSupervisor,
    /// Same pipeline the supervisor uses, for one-shot updates.
    pub updater: Arc<UpdatePipeline>,
    pub events: Arc<SupervisorEventBroadcaster>,
}

impl CliContext {
    pub fn settings(&self) -> &Settings {
        self.supervisor.settings()
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load settings from `path` (defaults when missing) and validate them.
pub fn load_settings(path: &Path) -> Result<Settings, CliError> {
    let settings = Settings::load_or_default(path)?;
    validate_settings(&settings)?;
    debug!(path = %path.display(), "Settings ready");
    Ok(settings)
}

/// Build the CLI context for the settings file at `config_path`.
pub fn bootstrap(config_path: &Path) -> Result<CliContext, CliError> {
    let settings = load_settings(config_path)?;
    let platform = SupportedOs::current()?;
    let layout = settings.paths.layout();
    layout.validate()?;

    let updater = Arc::new(
        UpdatePipeline::new(layout, settings.update.clone(), platform)
            .with_progress(Arc::new(CliProgress::new())),
    );
    let events = Arc::new(SupervisorEventBroadcaster::new());

    let deps = SupervisorDeps {
        emitter: events.clone(),
        ..SupervisorDeps::new(settings, platform, updater.clone())
    };

    Ok(CliContext {
        config_path: config_path.to_path_buf(),
        platform,
        supervisor: ServerSupervisor::new(deps),
        updater,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = load_settings(&tmp.path().join("fxhost.json")).unwrap();
        assert_eq!(settings.server.max_players, 32);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fxhost.json");
        std::fs::write(&path, r#"{"server":{"max_players":0}}"#).unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_unparsable_settings_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fxhost.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_settings(&path), Err(CliError::Config(_))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_bootstrap_wires_supervisor() {
        let tmp = TempDir::new().unwrap();
        let ctx = bootstrap(&tmp.path().join("fxhost.json")).unwrap();
        assert_eq!(ctx.platform, SupportedOs::Linux);
        assert_eq!(ctx.supervisor.state(), fxhost_core::ApplicationState::Stopped);
        assert_eq!(ctx.settings().server.hostname, "FiveM - by AMP");
    }
}
