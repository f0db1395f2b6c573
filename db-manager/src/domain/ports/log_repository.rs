//! Port for the append-only audit log.
//!
//! The log store sits outside any business transaction: entries written while
//! a user operation is in flight survive that operation's rollback.

use async_trait::async_trait;

use crate::domain::{LogEntry, LogEntryId, NewLogEntry};

use super::define_port_error;

define_port_error! {
    /// Errors raised by audit log adapters.
    pub enum LogRepositoryError {
        /// No entry carries the requested identifier.
        NotFound { id: LogEntryId } => "log entry {id} not found",
        /// Repository connection could not be established.
        Connection { message: String } => "log repository connection failed: {message}",
        /// Query or insert failed during execution.
        Query { message: String } => "log repository query failed: {message}",
    }
}

/// Port for audit entry persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Fetch every audit entry in insertion order.
    async fn get_logs(&self) -> Result<Vec<LogEntry>, LogRepositoryError>;

    /// Fetch one entry by identifier.
    async fn get_log_by_id(&self, id: LogEntryId) -> Result<LogEntry, LogRepositoryError>;

    /// Append an entry and return its assigned identifier.
    async fn insert_log(&self, entry: NewLogEntry) -> Result<LogEntryId, LogRepositoryError>;
}

/// Log store that discards every entry.
///
/// Useful where auditing is not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLogRepository;

#[async_trait]
impl LogRepository for FixtureLogRepository {
    async fn get_logs(&self) -> Result<Vec<LogEntry>, LogRepositoryError> {
        Ok(Vec::new())
    }

    async fn get_log_by_id(&self, id: LogEntryId) -> Result<LogEntry, LogRepositoryError> {
        Err(LogRepositoryError::not_found(id))
    }

    async fn insert_log(&self, _entry: NewLogEntry) -> Result<LogEntryId, LogRepositoryError> {
        Ok(LogEntryId::new(0))
    }
}
