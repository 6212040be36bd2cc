//! Quake-style RCON over UDP, as spoken by FXServer.
//!
//! Every datagram starts with four `0xFF` bytes. Commands are sent as
//! `rcon <password> <command>` and answered with `print <text>`, possibly
//! split over several datagrams.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fxhost_core::{ControlChannel, ControlChannelError, ControlChannelFactory};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

const PREFIX: [u8; 4] = [0xFF; 4];
const MAX_DATAGRAM: usize = 65_507;

/// How long to keep collecting datagrams after the first one of a response.
const CONTINUATION_WINDOW: Duration = Duration::from_millis(100);

/// Default wait for the first datagram of a response.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Default)]
struct Session {
    socket: Option<UdpSocket>,
    password: Option<String>,
}

/// One RCON session to a local FXServer.
pub struct QuakeRconChannel {
    session: Mutex<Session>,
    response_timeout: Duration,
}

impl QuakeRconChannel {
    pub fn new(response_timeout: Duration) -> Self {
        Self {
            session: Mutex::new(Session::default()),
            response_timeout,
        }
    }

    async fn exchange(
        &self,
        socket: &UdpSocket,
        body: &str,
    ) -> Result<Option<String>, ControlChannelError> {
        let mut packet = Vec::with_capacity(PREFIX.len() + body.len());
        packet.extend_from_slice(&PREFIX);
        packet.extend_from_slice(body.as_bytes());
        socket.send(&packet).await.map_err(io_err)?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        let first = match timeout(self.response_timeout, socket.recv(&mut buf)).await {
            Ok(received) => received.map_err(io_err)?,
            Err(_) => return Ok(None),
        };
        let mut response = decode(&buf[..first])?;

        while let Ok(received) = timeout(CONTINUATION_WINDOW, socket.recv(&mut buf)).await {
            response.push_str(&decode(&buf[..received.map_err(io_err)?])?);
        }

        Ok(Some(response))
    }
}

impl Default for QuakeRconChannel {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_TIMEOUT)
    }
}

#[async_trait]
impl ControlChannel for QuakeRconChannel {
    async fn connect(&self, host: &str, port: u16) -> Result<bool, ControlChannelError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await.map_err(io_err)?;
        socket.connect((host, port)).await.map_err(io_err)?;

        // A refused port shows up as an error on recv; the server is not up yet.
        let reply = match self.exchange(&socket, "getinfo fxhost").await {
            Ok(reply) => reply,
            Err(ControlChannelError::Io(reason)) => {
                debug!(%host, port, %reason, "RCON connection check failed");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let Some(reply) = reply else {
            return Ok(false);
        };
        if !reply.starts_with("infoResponse") {
            return Err(ControlChannelError::Protocol(reply));
        }

        self.session.lock().await.socket = Some(socket);
        Ok(true)
    }

    async fn login(&self, secret: &str) -> Result<bool, ControlChannelError> {
        let mut session = self.session.lock().await;
        let socket = session
            .socket
            .as_ref()
            .ok_or(ControlChannelError::NotConnected)?;

        let reply = self
            .exchange(socket, &format!("rcon {secret} status"))
            .await?
            .ok_or(ControlChannelError::Timeout(duration_ms(self.response_timeout)))?;
        if reply.contains("Invalid password") {
            return Ok(false);
        }

        session.password = Some(secret.to_string());
        Ok(true)
    }

    async fn send(&self, command: &str) -> Result<Option<String>, ControlChannelError> {
        let session = self.session.lock().await;
        let (Some(socket), Some(password)) = (&session.socket, &session.password) else {
            return Err(ControlChannelError::NotConnected);
        };

        let reply = self
            .exchange(socket, &format!("rcon {password} {command}"))
            .await?;
        Ok(reply.filter(|r| !r.trim().is_empty()))
    }
}

/// Creates a fresh [`QuakeRconChannel`] per launch.
#[derive(Debug, Clone, Copy)]
pub struct QuakeRconFactory {
    pub response_timeout: Duration,
}

impl Default for QuakeRconFactory {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl ControlChannelFactory for QuakeRconFactory {
    fn create(&self) -> Arc<dyn ControlChannel> {
        Arc::new(QuakeRconChannel::new(self.response_timeout))
    }
}

/// Strip the packet prefix and the `print` verb.
fn decode(datagram: &[u8]) -> Result<String, ControlChannelError> {
    let body = datagram.strip_prefix(&PREFIX).ok_or_else(|| {
        ControlChannelError::Protocol("datagram without 0xFFFFFFFF prefix".to_string())
    })?;
    let text = String::from_utf8_lossy(body);
    let text = text
        .strip_prefix("print")
        .map_or(&*text, |rest| {
            rest.strip_prefix(['\n', ' ']).unwrap_or(rest)
        });
    Ok(text.to_string())
}

fn io_err(e: std::io::Error) -> ControlChannelError {
    ControlChannelError::Io(e.to_string())
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal FXServer stand-in: answers `getinfo` and `rcon` packets.
    async fn fake_server(password: &'static str) -> u16 {
        let socket = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let port = socket.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            loop {
                let Ok((n, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let body = String::from_utf8_lossy(&buf[4..n]).to_string();
                let reply = if body.starts_with("getinfo") {
                    "infoResponse\n\\hostname\\test".to_string()
                } else if let Some(rest) = body.strip_prefix("rcon ") {
                    let (pass, cmd) = rest.split_once(' ').unwrap_or((rest, ""));
                    if pass == password {
                        format!("print {cmd} ok\n")
                    } else {
                        "print Invalid password.\n".to_string()
                    }
                } else {
                    continue;
                };
                let mut packet = PREFIX.to_vec();
                packet.extend_from_slice(reply.as_bytes());
                socket.send_to(&packet, peer).await.unwrap();
            }
        });
        port
    }

    #[tokio::test]
    async fn connect_login_send() {
        let port = fake_server("hunter2").await;
        let channel = QuakeRconChannel::new(Duration::from_secs(1));

        assert!(channel.connect("127.0.0.1", port).await.unwrap());
        assert!(channel.login("hunter2").await.unwrap());
        let reply = channel.send("status").await.unwrap();
        assert_eq!(reply.as_deref(), Some("status ok\n"));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let port = fake_server("hunter2").await;
        let channel = QuakeRconChannel::new(Duration::from_secs(1));

        assert!(channel.connect("127.0.0.1", port).await.unwrap());
        assert!(!channel.login("nope").await.unwrap());
        assert!(matches!(
            channel.send("status").await,
            Err(ControlChannelError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn silent_endpoint_is_not_connected() {
        // Bound but never answers
        let silent = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let channel = QuakeRconChannel::new(Duration::from_millis(100));

        assert!(!channel.connect("127.0.0.1", port).await.unwrap());
    }

    #[tokio::test]
    async fn login_requires_connect() {
        let channel = QuakeRconChannel::default();
        assert!(matches!(
            channel.login("x").await,
            Err(ControlChannelError::NotConnected)
        ));
    }

    #[test]
    fn decode_strips_prefix_and_verb() {
        let mut packet = PREFIX.to_vec();
        packet.extend_from_slice(b"print\nhello");
        assert_eq!(decode(&packet).unwrap(), "hello");
        assert!(decode(b"print hello").is_err());
    }
}
