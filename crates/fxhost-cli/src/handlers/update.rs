//! One-shot `update` and `update-data` handlers.

use anyhow::Result;

use super::require_success;
use crate::bootstrap::CliContext;

/// Install the newest server build, then leave the server stopped.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    require_success(ctx.supervisor.update_now().await)?;
    println!(
        "✓ Server files installed in {}",
        ctx.supervisor.layout().game_path.display()
    );
    Ok(())
}

/// Install the baseline server-data set.
pub async fn execute_data(ctx: &CliContext) -> Result<()> {
    require_success(ctx.supervisor.update_data().await)?;
    println!(
        "✓ Server data installed in {}",
        ctx.supervisor.layout().data_path.display()
    );
    Ok(())
}
