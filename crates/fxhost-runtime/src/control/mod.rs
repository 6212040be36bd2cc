//! Control channel adapters and the per-launch bootstrap.

mod bootstrap;
mod rcon;

pub use bootstrap::{
    BootstrapOutcome, BootstrapStatus, ControlChannelBootstrapper, ControlChannelSession,
    ControlTimings,
};
pub use rcon::{QuakeRconChannel, QuakeRconFactory};
