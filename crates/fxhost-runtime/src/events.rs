//! Supervisor event broadcasting.

use fxhost_core::{SupervisorEvent, SupervisorEventEmitter};
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for supervisor events
const CHANNEL_CAPACITY: usize = 64;

/// Fans supervisor events out to any number of subscribers.
pub struct SupervisorEventBroadcaster {
    sender: broadcast::Sender<SupervisorEvent>,
}

impl SupervisorEventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SupervisorEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisorEventEmitter for SupervisorEventBroadcaster {
    fn emit(&self, event: SupervisorEvent) {
        // No receivers is not an error
        if self.sender.receiver_count() > 0 {
            debug!(?event, "Broadcasting supervisor event");
            let _ = self.sender.send(event);
        }
    }
}
