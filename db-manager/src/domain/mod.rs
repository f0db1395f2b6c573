//! Domain primitives and ports.
//!
//! Purpose: Define the user and audit-log records shared by the decorators,
//! the storage adapters, and the command loop. Storage-assigned fields
//! (identifiers, timestamps) are never accepted from callers; the `New*`
//! types carry only what a caller may supply.
//!
//! Public surface:
//! - User, NewUser, UserId, WriteOutcome: user records and write results.
//! - LogEntry, NewLogEntry, LogEntryId: append-only audit entries.
//! - ports: repository and transaction contracts.

pub mod log_entry;
pub mod ports;
pub mod user;

pub use self::log_entry::{LogEntry, LogEntryId, NewLogEntry};
pub use self::user::{IdParseError, NewUser, User, UserId, WriteOutcome};
