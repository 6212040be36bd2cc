//! Console entries and the bounded backscroll buffer.
//!
//! Entries are produced from server stdout/stderr lines and from the
//! supervisor itself. The buffer keeps only the most recent
//! [`CONSOLE_BACKSCROLL`] entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of entries retained in the console buffer
pub const CONSOLE_BACKSCROLL: usize = 40;

/// Source tag for lines read from the server's output streams
pub const SOURCE_CONSOLE: &str = "Console";

/// Source tag for entries written by the supervisor itself
pub const SOURCE_SUPERVISOR: &str = "Supervisor";

/// Source tag for replies returned by the control channel
pub const SOURCE_RCON: &str = "RCON";

/// Type tag of a console entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular output (stdout, supervisor messages)
    #[default]
    Console,
    /// Output read from the error stream
    Error,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => f.write_str("Console"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// A single captured console line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    /// Capture time
    pub timestamp: DateTime<Utc>,
    /// Producer of the line (see the `SOURCE_*` constants)
    pub source: String,
    /// Stream type tag
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Line content without the trailing newline
    pub contents: String,
}

impl ConsoleEntry {
    /// Create an entry stamped with the current time.
    pub fn new(source: impl Into<String>, kind: EntryKind, contents: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            kind,
            contents: contents.into(),
        }
    }

    /// Entry for a line read from the server's standard output.
    pub fn stdout(contents: impl Into<String>) -> Self {
        Self::new(SOURCE_CONSOLE, EntryKind::Console, contents)
    }

    /// Entry for a line read from the server's standard error.
    pub fn stderr(contents: impl Into<String>) -> Self {
        Self::new(SOURCE_CONSOLE, EntryKind::Error, contents)
    }
}

/// Ring buffer of recent console entries, oldest first.
#[derive(Debug, Clone)]
pub struct ConsoleBuffer {
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleBuffer {
    /// Create an empty buffer holding [`CONSOLE_BACKSCROLL`] entries.
    pub fn new() -> Self {
        Self::with_capacity(CONSOLE_BACKSCROLL)
    }

    /// Create an empty buffer with a custom capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one when full.
    pub fn push(&mut self, entry: ConsoleEntry) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries strictly newer than `since`, or all entries when `None`.
    pub fn entries_since(&self, since: Option<DateTime<Utc>>) -> Vec<ConsoleEntry> {
        match since {
            Some(ts) => self
                .entries
                .iter()
                .filter(|e| e.timestamp > ts)
                .cloned()
                .collect(),
            None => self.entries.iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
