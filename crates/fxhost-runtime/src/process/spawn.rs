//! Server process launch.

use std::process::Stdio;

use fxhost_core::{InstallationLayout, SupportedOs};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use super::ProcessError;

/// Launch the server executable with redirected standard streams.
///
/// The working directory is the install's `server-data` folder. On Windows
/// the directives are passed verbatim and no console window is created; on
/// Unix each directive is split into argv words.
pub fn launch_server(
    layout: &InstallationLayout,
    os: SupportedOs,
    directives: &[String],
) -> Result<Child, ProcessError> {
    let executable = layout.executable(os);
    if !executable.is_file() {
        return Err(ProcessError::ExecutableMissing(executable));
    }

    let mut cmd = std::process::Command::new(&executable);
    cmd.current_dir(layout.working_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    apply_directives(&mut cmd, directives);

    debug!(executable = %executable.display(), count = directives.len(), "Launching server");

    let mut cmd = Command::from(cmd);
    cmd.kill_on_drop(true);
    let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        path: executable.clone(),
        source,
    })?;

    info!(pid = ?child.id(), "Server process started");
    Ok(child)
}

#[cfg(windows)]
fn apply_directives(cmd: &mut std::process::Command, directives: &[String]) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.raw_arg(directives.join(" "))
        .creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn apply_directives(cmd: &mut std::process::Command, directives: &[String]) {
    cmd.args(
        directives
            .iter()
            .map(String::as_str)
            .flat_map(crate::args::split_directive),
    );
}
