//! Supervisor event emission.

use crate::events::SupervisorEvent;

/// Sink for lifecycle notifications.
///
/// Implementations must not block: `emit` is called while the supervisor
/// is in the middle of a transition.
pub trait SupervisorEventEmitter: Send + Sync {
    fn emit(&self, event: SupervisorEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl SupervisorEventEmitter for NoopEmitter {
    fn emit(&self, _event: SupervisorEvent) {}
}
