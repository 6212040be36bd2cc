//! `run` handler: start the server and attach to it.
//!
//! Server output reaches the terminal through the `fxhost::console` log
//! target. Stdin lines are forwarded as console commands; a leading `/`
//! selects a supervisor control instead.

use anyhow::Result;
use fxhost_core::{ActionResult, ApplicationState, StopKind, SupervisorEvent};
use fxhost_runtime::ServerSupervisor;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::require_success;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorInput {
    Empty,
    Stop,
    Restart,
    Update,
    Kill,
    Command(String),
    Unknown(String),
}

impl OperatorInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        match line.strip_prefix('/') {
            Some("stop") => Self::Stop,
            Some("restart") => Self::Restart,
            Some("update") => Self::Update,
            Some("kill") => Self::Kill,
            Some(other) => Self::Unknown(other.to_string()),
            None => Self::Command(line.to_string()),
        }
    }
}

/// Why the attach loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Requested,
    Crashed,
    Failed,
}

fn report(action: &str, result: &ActionResult) {
    if let Some(reason) = result.reason() {
        warn!(%reason, "{action} refused");
    }
}

/// Start the server and supervise it until stopped.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let supervisor = &ctx.supervisor;
    let mut events = ctx.events.subscribe();

    info!(name = supervisor.application_name(), "Starting server");
    require_success(supervisor.start().await)?;

    match attach(supervisor, &mut events).await? {
        Exit::Requested => Ok(()),
        Exit::Crashed => Err(CliError::Action("Server exited unexpectedly".to_string()).into()),
        Exit::Failed => Err(CliError::Action("Server failed to start".to_string()).into()),
    }
}

async fn attach(
    supervisor: &ServerSupervisor,
    events: &mut tokio::sync::broadcast::Receiver<SupervisorEvent>,
) -> Result<Exit> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    // Set by /update so the server comes back once installed
    let mut resume_after_update = false;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping server");
                report("Stop", &supervisor.stop().await);
                return Ok(Exit::Requested);
            }

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    debug!("Stdin closed, console input disabled");
                    stdin_open = false;
                    continue;
                };
                match OperatorInput::parse(&line) {
                    OperatorInput::Empty => {}
                    OperatorInput::Stop => {
                        report("Stop", &supervisor.stop().await);
                        return Ok(Exit::Requested);
                    }
                    OperatorInput::Kill => {
                        report("Kill", &supervisor.kill().await);
                        return Ok(Exit::Requested);
                    }
                    OperatorInput::Restart => report("Restart", &supervisor.restart().await),
                    OperatorInput::Update => {
                        // "Stopping instance!" means the update is queued
                        let result = supervisor.request_update();
                        resume_after_update = result.is_success()
                            || result.reason() == Some("Stopping instance!");
                        if resume_after_update {
                            info!("Update scheduled");
                        } else {
                            report("Update", &result);
                        }
                    }
                    OperatorInput::Command(command) => {
                        report("Command", &supervisor.write_line(&command).await);
                    }
                    OperatorInput::Unknown(name) => {
                        warn!(command = %name, "Unknown control, expected /stop, /restart, /update or /kill");
                    }
                }
            }

            event = events.recv() => match event {
                Ok(SupervisorEvent::StateChanged { old, new }) => {
                    debug!(%old, %new, "State changed");
                    match (old, new) {
                        (_, ApplicationState::Ready) => info!("Server is ready"),
                        (_, ApplicationState::Failed) => return Ok(Exit::Failed),
                        (ApplicationState::Installing, ApplicationState::Stopped)
                            if resume_after_update =>
                        {
                            resume_after_update = false;
                            info!("Update finished, starting server");
                            require_success(supervisor.start().await)?;
                        }
                        _ => {}
                    }
                }
                Ok(SupervisorEvent::Stopped { kind: StopKind::Unexpected, .. }) => {
                    warn!("Server exited unexpectedly");
                    return Ok(Exit::Crashed);
                }
                Ok(SupervisorEvent::Stopped { kind: StopKind::Normal, .. }) => {}
                Err(RecvError::Lagged(missed)) => debug!(missed, "Event receiver lagged"),
                Err(RecvError::Closed) => return Ok(Exit::Requested),
            },
        }
    }
}
