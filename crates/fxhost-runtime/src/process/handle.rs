use chrono::{DateTime, Utc};
use tokio::process::ChildStdin;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The live server process, owned by the supervisor.
///
/// The `Child` itself lives in the exit-watcher task. Cancelling `stop`
/// makes the watcher terminate it gracefully, cancelling `kill` terminates it
/// right away; either way the watcher reaps the process and runs the exit
/// handler before finishing.
#[derive(Debug)]
pub struct ServerProcessHandle {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub(crate) stop: CancellationToken,
    pub(crate) kill: CancellationToken,
    pub(crate) watcher: JoinHandle<()>,
    /// Held open so the server does not see EOF on stdin
    pub(crate) _stdin: Option<ChildStdin>,
}

impl ServerProcessHandle {
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}
