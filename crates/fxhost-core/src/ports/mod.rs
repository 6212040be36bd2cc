//! Port definitions (trait abstractions) for external systems.
//!
//! The supervisor only talks to the network control channel, the update
//! pipeline and its observers through these traits. They use domain types
//! only; transports and filesystem details live in `fxhost-runtime`.

pub mod console_interceptor;
pub mod control_channel;
pub mod event_emitter;
pub mod secret;
pub mod updater;

pub use console_interceptor::{ConsoleInterceptor, Interception};
pub use control_channel::{ControlChannel, ControlChannelError, ControlChannelFactory};
pub use event_emitter::{NoopEmitter, SupervisorEventEmitter};
pub use secret::{FixedSecret, RandomSecret, SecretGenerator};
pub use updater::{UpdateError, Updater};
