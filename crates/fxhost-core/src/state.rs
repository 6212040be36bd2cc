//! Application lifecycle state.
//!
//! The supervisor owns exactly one current `ApplicationState`. All mutation
//! goes through the supervisor's transition methods; this module only defines
//! the value type and the predicates the transition rules are built from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the supervised server instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationState {
    /// No process is running.
    #[default]
    Stopped,
    /// Binaries are present, data set is being validated before launch.
    PreStart,
    /// The update pipeline is installing or updating the server binaries.
    Installing,
    /// Process launched, control channel not yet settled.
    Starting,
    /// Process running; the control channel bootstrap has completed.
    Ready,
    /// A stop was requested and the process is being torn down.
    Stopping,
    /// A restart was requested; the process will be started again on exit.
    Restarting,
    /// The server could not be installed. Terminal until the next start.
    Failed,
    /// Reserved. The FXServer wrapper never enters this state.
    Sleeping,
}

impl ApplicationState {
    /// Whether a start request may launch a new instance from this state.
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// Whether operator console writes are accepted in this state.
    pub const fn accepts_console_input(self) -> bool {
        !matches!(self, Self::Stopped | Self::Sleeping)
    }

    /// Whether process resource statistics are meaningful in this state.
    pub const fn has_live_process(self) -> bool {
        matches!(self, Self::Starting | Self::Ready | Self::Stopping)
    }

    /// Whether a process exit observed in this state was requested.
    pub const fn expects_exit(self) -> bool {
        matches!(self, Self::Stopping | Self::Restarting)
    }

    /// Lowercase name used in logs and serialized events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::PreStart => "prestart",
            Self::Installing => "installing",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopping => "stopping",
            Self::Restarting => "restarting",
            Self::Failed => "failed",
            Self::Sleeping => "sleeping",
        }
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
