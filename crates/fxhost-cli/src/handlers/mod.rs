//! Command handlers.
//!
//! Each handler is a thin wrapper: it calls into the supervisor or the update
//! pipeline held by [`CliContext`](crate::bootstrap::CliContext) and formats
//! the outcome for the terminal. Refused supervisor operations become
//! [`CliError::Action`](crate::error::CliError::Action).

pub mod args;
pub mod config;
pub mod run;
pub mod status;
pub mod update;

use fxhost_core::ActionResult;

use crate::error::CliError;

/// Turn a refused operation into an error.
pub(crate) fn require_success(result: ActionResult) -> Result<(), CliError> {
    match result {
        ActionResult::Success => Ok(()),
        ActionResult::Failure { reason } => Err(CliError::Action(reason)),
    }
}
