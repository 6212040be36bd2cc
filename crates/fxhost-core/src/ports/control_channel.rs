//! Secondary network control channel.
//!
//! The channel is used to send text commands to a running server once it
//! is healthy. Its wire format is an adapter concern.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a control-channel transport.
#[derive(Debug, Error)]
pub enum ControlChannelError {
    #[error("Control channel is not connected")]
    NotConnected,

    #[error("Control channel I/O failed: {0}")]
    Io(String),

    #[error("Control channel timed out after {0}ms")]
    Timeout(u64),

    #[error("Unexpected control channel response: {0}")]
    Protocol(String),
}

/// A connection to the server's command endpoint.
///
/// `connect` and `login` report refusal as `Ok(false)`; `Err` is reserved
/// for transport failures. Both are treated the same way by the bootstrap
/// (non-fatal, writes disabled).
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Open the channel and check that the remote end answers.
    async fn connect(&self, host: &str, port: u16) -> Result<bool, ControlChannelError>;

    /// Authenticate with the per-launch secret.
    async fn login(&self, secret: &str) -> Result<bool, ControlChannelError>;

    /// Send one command line. Returns the server's textual response, if any.
    async fn send(&self, command: &str) -> Result<Option<String>, ControlChannelError>;
}

/// Creates a fresh, unconnected channel for each launch.
pub trait ControlChannelFactory: Send + Sync {
    fn create(&self) -> Arc<dyn ControlChannel>;
}
