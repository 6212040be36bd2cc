//! Process runtime for the fxhost supervisor.
//!
//! This crate implements the OS-facing half of fxhost: launching and
//! reaping the FXServer process, capturing its console, the UDP RCON
//! control channel, and the stage-then-merge update pipeline. The
//! [`ServerSupervisor`] ties them together behind the lifecycle state machine
//! defined in `fxhost-core`.

#![deny(unused_crate_dependencies)]

pub mod args;
pub mod console;
pub mod control;
pub mod events;
pub mod process;
pub mod stream;
pub mod supervisor;
pub mod update;

pub use args::{build_launch_arguments, mask_secret, split_directive};
pub use console::ConsoleCapture;
pub use control::{
    BootstrapOutcome, BootstrapStatus, ControlChannelBootstrapper, ControlChannelSession,
    ControlTimings, QuakeRconChannel, QuakeRconFactory,
};
pub use events::SupervisorEventBroadcaster;
pub use process::{ProcessError, ProcessUsage, ServerProcessHandle, UsageSampler};
pub use supervisor::{APPLICATION_NAME, DEFAULT_SHUTDOWN_GRACE, ServerSupervisor, SupervisorDeps};
#[cfg(feature = "cli")]
pub use update::CliProgress;
pub use update::{NoopProgress, ProgressReporter, UpdatePipeline};
