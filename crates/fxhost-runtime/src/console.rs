//! Shared console capture for the supervised process.
//!
//! Every line goes through the interceptors first. An entry any interceptor
//! cancels is neither buffered nor logged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use fxhost_core::{ConsoleBuffer, ConsoleEntry, ConsoleInterceptor, EntryKind, Interception};
use tracing::{info, warn};

/// Bounded console log plus its interception hooks.
#[derive(Default)]
pub struct ConsoleCapture {
    buffer: Mutex<ConsoleBuffer>,
    interceptors: RwLock<Vec<Arc<dyn ConsoleInterceptor>>>,
}

impl ConsoleCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interceptor. Interceptors run in registration order.
    pub fn add_interceptor(&self, interceptor: Arc<dyn ConsoleInterceptor>) {
        self.interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(interceptor);
    }

    /// Offer a captured line to the interceptors, then buffer and log it.
    ///
    /// Every interceptor sees the entry, even after one has cancelled it.
    /// Returns `false` when any interceptor cancelled the entry.
    pub fn offer(&self, entry: ConsoleEntry) -> bool {
        let mut cancelled = false;
        for interceptor in self
            .interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            cancelled |= interceptor.intercept(&entry) == Interception::Cancel;
        }
        if cancelled {
            return false;
        }
        self.append(entry);
        true
    }

    /// Buffer and log an entry without interception.
    pub fn append(&self, entry: ConsoleEntry) {
        match entry.kind {
            EntryKind::Console => {
                info!(target: "fxhost::console", source = %entry.source, "{}", entry.contents);
            }
            EntryKind::Error => {
                warn!(target: "fxhost::console", source = %entry.source, "{}", entry.contents);
            }
        }
        self.buffer().push(entry);
    }

    /// Entries strictly newer than `since`, oldest first.
    pub fn entries_since(&self, since: Option<DateTime<Utc>>) -> Vec<ConsoleEntry> {
        self.buffer().entries_since(since)
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    fn buffer(&self) -> MutexGuard<'_, ConsoleBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
