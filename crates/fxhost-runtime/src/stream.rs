//! Async console stream readers (non-UTF8-safe).
//!
//! FXServer can emit non-UTF8 bytes on stdout/stderr, and `BufReader::lines()`
//! would end the reader task on the first one. Lines are read as bytes and
//! decoded lossily instead.

use std::sync::Arc;

use fxhost_core::{ConsoleEntry, EntryKind, SOURCE_CONSOLE};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::console::ConsoleCapture;

/// Forward every non-empty line of `stream` into `capture`.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: EntryKind,
    capture: Arc<ConsoleCapture>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    if buf.is_empty() {
                        continue;
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    capture.offer(ConsoleEntry::new(SOURCE_CONSOLE, kind, line));
                }
                Err(e) => {
                    debug!(%kind, error = %e, "Console reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(%kind, "Console reader task exiting");
    })
}
