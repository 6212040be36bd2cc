//! Result type returned by operator-facing operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an operator request (start, stop, update, console write...).
///
/// Precondition failures are reported synchronously with a readable reason.
/// Work that continues in the background reports its own failures through
/// the log only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum ActionResult {
    Success,
    Failure { reason: String },
}

impl ActionResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure { reason } => write!(f, "failure: {reason}"),
        }
    }
}
