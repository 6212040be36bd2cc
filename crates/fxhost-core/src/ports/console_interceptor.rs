//! Cancellable hook offered every captured console line.

use crate::console::ConsoleEntry;

/// Verdict of an interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interception {
    /// Buffer and log the entry as usual
    #[default]
    Continue,
    /// The interceptor owns the entry; skip buffering and logging
    Cancel,
}

/// Observes console lines before they are buffered.
pub trait ConsoleInterceptor: Send + Sync {
    fn intercept(&self, entry: &ConsoleEntry) -> Interception;
}

impl<F> ConsoleInterceptor for F
where
    F: Fn(&ConsoleEntry) -> Interception + Send + Sync,
{
    fn intercept(&self, entry: &ConsoleEntry) -> Interception {
        self(entry)
    }
}
