//! Per-launch control-channel bootstrap.
//!
//! After a settle delay the bootstrapper connects with retries, then
//! authenticates with the launch secret. Nothing here is fatal: whatever the
//! outcome, the caller moves the server to Ready. Only an authenticated
//! session enables console writes.

use std::sync::Arc;
use std::time::Duration;

use fxhost_core::settings::{
    ControlSettings, DEFAULT_MAX_CONNECT_ATTEMPTS, DEFAULT_RETRY_INTERVAL, DEFAULT_SETTLE_DELAY,
};
use fxhost_core::ControlChannel;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Bootstrap timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTimings {
    pub settle_delay: Duration,
    pub retry_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ControlTimings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: DEFAULT_MAX_CONNECT_ATTEMPTS,
        }
    }
}

impl From<&ControlSettings> for ControlTimings {
    fn from(settings: &ControlSettings) -> Self {
        Self {
            settle_delay: settings.settle_delay(),
            retry_interval: settings.retry_interval(),
            max_attempts: settings.max_connect_attempts.max(1),
        }
    }
}

/// Connection state reached by one bootstrap run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlChannelSession {
    pub connected: bool,
    pub authenticated: bool,
    pub attempt_count: u32,
}

impl ControlChannelSession {
    /// Whether console writes may go through this session.
    pub const fn is_usable(&self) -> bool {
        self.connected && self.authenticated
    }
}

/// How the bootstrap ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    /// The server left Starting; no transition must follow.
    Aborted,
    Authenticated,
    AuthRejected,
    /// Every connect attempt failed.
    Unreachable,
    /// The transport raised an error.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOutcome {
    pub session: ControlChannelSession,
    pub status: BootstrapStatus,
}

impl BootstrapOutcome {
    /// Whether the caller should move Starting → Ready.
    pub fn completes_startup(&self) -> bool {
        self.status != BootstrapStatus::Aborted
    }
}

/// Runs the connect/login sequence for one launch.
pub struct ControlChannelBootstrapper {
    channel: Arc<dyn ControlChannel>,
    host: String,
    port: u16,
    timings: ControlTimings,
}

impl ControlChannelBootstrapper {
    pub fn new(
        channel: Arc<dyn ControlChannel>,
        host: impl Into<String>,
        port: u16,
        timings: ControlTimings,
    ) -> Self {
        Self {
            channel,
            host: host.into(),
            port,
            timings,
        }
    }

    /// Run the bootstrap. `still_starting` is polled before each step.
    pub async fn run<F>(&self, secret: &str, still_starting: F) -> BootstrapOutcome
    where
        F: Fn() -> bool + Send + Sync,
    {
        let mut session = ControlChannelSession::default();

        sleep(self.timings.settle_delay).await;
        if !still_starting() {
            warn!("Tried to start RCON but server is not running");
            return BootstrapOutcome {
                session,
                status: BootstrapStatus::Aborted,
            };
        }

        loop {
            session.attempt_count += 1;
            debug!(attempt = session.attempt_count, host = %self.host, port = self.port, "Connecting to RCON");

            match self.channel.connect(&self.host, self.port).await {
                Ok(connected) => session.connected = connected,
                Err(e) => return Self::failed(session, e.to_string()),
            }
            if session.connected {
                break;
            }

            warn!(attempt = session.attempt_count, "RCON connection failed");
            if session.attempt_count >= self.timings.max_attempts {
                warn!("RCON connection failed, console write unavailable");
                return BootstrapOutcome {
                    session,
                    status: BootstrapStatus::Unreachable,
                };
            }

            sleep(self.timings.retry_interval).await;
            if !still_starting() {
                debug!("Server left Starting while waiting for RCON");
                return BootstrapOutcome {
                    session,
                    status: BootstrapStatus::Aborted,
                };
            }
        }

        debug!("Authenticating RCON session");
        match self.channel.login(secret).await {
            Ok(true) => {
                info!("RCON connection successful");
                session.authenticated = true;
                BootstrapOutcome {
                    session,
                    status: BootstrapStatus::Authenticated,
                }
            }
            Ok(false) => {
                warn!("RCON login rejected, console write unavailable");
                BootstrapOutcome {
                    session,
                    status: BootstrapStatus::AuthRejected,
                }
            }
            Err(e) => Self::failed(session, e.to_string()),
        }
    }

    fn failed(session: ControlChannelSession, reason: String) -> BootstrapOutcome {
        warn!(%reason, "RCON connection failed, console write unavailable");
        BootstrapOutcome {
            session,
            status: BootstrapStatus::Failed(reason),
        }
    }
}
