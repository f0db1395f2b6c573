//! Audit log entries.
//!
//! Entries are append-only: the log store assigns the identifier, and nothing
//! in this crate updates or deletes an entry once written.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to an audit entry by the log store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntryId(i32);

impl LogEntryId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Access the raw integer value.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for LogEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An audit entry waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    /// When the audited event happened.
    pub logged_at: DateTime<Utc>,
    /// Free-text description of the attempt or its outcome.
    pub message: String,
}

impl NewLogEntry {
    /// Build an entry for `message` stamped at `logged_at`.
    pub fn new(message: impl Into<String>, logged_at: DateTime<Utc>) -> Self {
        Self {
            logged_at,
            message: message.into(),
        }
    }
}

/// A persisted audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Identifier assigned on insert.
    pub id: LogEntryId,
    /// When the audited event happened.
    pub logged_at: DateTime<Utc>,
    /// Free-text description of the attempt or its outcome.
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.id,
            self.logged_at.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}
