//! `args` handler: show the launch directives.

use anyhow::Result;
use fxhost_core::{RandomSecret, SecretGenerator};
use fxhost_runtime::{build_launch_arguments, mask_secret};

use crate::bootstrap::CliContext;

/// Print one directive per line. The RCON secret is generated per launch,
/// so a throwaway one is used and masked.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let secret = RandomSecret.generate();
    let args = build_launch_arguments(&ctx.settings().server, ctx.supervisor.layout(), &secret)?;

    println!(
        "{}",
        ctx.supervisor.layout().executable(ctx.platform).display()
    );
    for arg in mask_secret(&args, &secret) {
        println!("  {arg}");
    }
    Ok(())
}
