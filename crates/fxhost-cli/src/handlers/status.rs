//! `status` handler.

use anyhow::Result;
use tracing::debug;

use crate::bootstrap::CliContext;

fn mark(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}

/// Print local install status and the newest published build.
///
/// An unreachable index is reported inline, not as an error.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let supervisor = &ctx.supervisor;
    let layout = supervisor.layout();
    let settings = ctx.settings();

    println!("{}", supervisor.application_name());
    println!("  settings file   {}", ctx.config_path.display());
    println!("  platform        {}", ctx.platform);
    println!("  game path       {}", layout.game_path.display());
    println!("  data path       {}", layout.data_path.display());
    println!("  installed       {}", mark(supervisor.is_installed()));
    println!("  server data     {}", mark(supervisor.is_data_path_valid()));
    println!("  max players     {}", supervisor.max_users());
    println!(
        "  rcon            {}:{}",
        settings.control.host,
        settings.control_port()
    );

    match ctx.updater.latest_remote_release().await {
        Ok(release) => println!(
            "  latest build    {} ({})",
            release.version_name(),
            release.released_at.format("%Y-%m-%d %H:%M")
        ),
        Err(e) => {
            debug!(error = %e, "Release index unavailable");
            println!("  latest build    unavailable ({e})");
        }
    }
    Ok(())
}
