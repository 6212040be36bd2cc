//! Supervisor lifecycle events.
//!
//! Observers receive these through a [`SupervisorEventEmitter`](crate::ports::SupervisorEventEmitter).
//! Stop notifications come in two categories so callers can decide whether to
//! alert or restart on an unexpected exit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ApplicationState;

/// How a server process exit was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    /// The exit followed a stop or restart request.
    Normal,
    /// The process died on its own (crash, external kill).
    Unexpected,
}

/// Event payload emitted by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupervisorEvent {
    /// The current state changed. Never emitted for `old == new`.
    StateChanged {
        old: ApplicationState,
        new: ApplicationState,
    },

    /// The server process exited.
    Stopped { kind: StopKind, at: DateTime<Utc> },
}

impl SupervisorEvent {
    pub const fn state_changed(old: ApplicationState, new: ApplicationState) -> Self {
        Self::StateChanged { old, new }
    }

    /// Stop notification stamped with the current time.
    pub fn stopped(kind: StopKind) -> Self {
        Self::Stopped {
            kind,
            at: Utc::now(),
        }
    }

    /// The stop category, if this is a stop notification.
    pub const fn stop_kind(&self) -> Option<StopKind> {
        match self {
            Self::Stopped { kind, .. } => Some(*kind),
            Self::StateChanged { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_change_serialization() {
        let event =
            SupervisorEvent::state_changed(ApplicationState::Starting, ApplicationState::Ready);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"state_changed\""));
        assert!(json.contains("\"old\":\"starting\""));
        assert!(json.contains("\"new\":\"ready\""));
    }

    #[test]
    fn stop_kind_accessor() {
        assert_eq!(
            SupervisorEvent::stopped(StopKind::Unexpected).stop_kind(),
            Some(StopKind::Unexpected)
        );
        assert_eq!(
            SupervisorEvent::state_changed(ApplicationState::Stopped, ApplicationState::PreStart)
                .stop_kind(),
            None
        );
    }
}
