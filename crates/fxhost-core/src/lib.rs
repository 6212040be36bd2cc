//! Core domain types and port definitions for the fxhost server supervisor.
//!
//! This crate has no knowledge of processes, sockets or HTTP. It defines the
//! lifecycle state machine vocabulary, the bounded console buffer, settings,
//! the installation layout and the traits the runtime adapters implement.

#![deny(unused_crate_dependencies)]

pub mod action;
pub mod console;
pub mod events;
pub mod paths;
pub mod ports;
pub mod release;
pub mod settings;
pub mod state;

pub use action::ActionResult;
pub use console::{
    CONSOLE_BACKSCROLL, ConsoleBuffer, ConsoleEntry, EntryKind, SOURCE_CONSOLE, SOURCE_RCON,
    SOURCE_SUPERVISOR,
};
pub use events::{StopKind, SupervisorEvent};
pub use paths::{CITIZEN_DIR, InstallationLayout, PathError, SERVER_DATA_DIR, SupportedOs};
pub use ports::{
    ConsoleInterceptor, ControlChannel, ControlChannelError, ControlChannelFactory, FixedSecret,
    Interception, NoopEmitter, RandomSecret, SecretGenerator, SupervisorEventEmitter, UpdateError,
    Updater,
};
pub use release::ReleaseDescriptor;
pub use settings::{
    ConVar, ConVarValue, ControlSettings, PathSettings, ServerSettings, Settings, SettingsError,
    UpdateSettings, validate_settings,
};
pub use state::ApplicationState;

// Only exercised by the integration tests
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio as _;
