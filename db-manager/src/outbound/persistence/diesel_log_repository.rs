//! PostgreSQL-backed `LogRepository` implementation using Diesel ORM.
//!
//! Every call checks out its own pooled connection, so audit entries commit
//! independently of any user transaction in flight.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LogRepository, LogRepositoryError};
use crate::domain::{LogEntry, LogEntryId, NewLogEntry};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{LogRow, NewLogRow};
use super::pool::{DbPool, PoolError};
use super::schema::logs;

/// Diesel-backed implementation of the `LogRepository` port.
#[derive(Clone)]
pub struct DieselLogRepository {
    pool: DbPool,
}

impl DieselLogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> LogRepositoryError {
    map_pool_error(error, LogRepositoryError::connection)
}

fn map_error(error: diesel::result::Error) -> LogRepositoryError {
    map_diesel_error(
        error,
        LogRepositoryError::query,
        LogRepositoryError::connection,
    )
}

#[async_trait]
impl LogRepository for DieselLogRepository {
    async fn get_logs(&self) -> Result<Vec<LogEntry>, LogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<LogRow> = logs::table
            .select(LogRow::as_select())
            .order_by(logs::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_error)?;

        Ok(rows.into_iter().map(LogEntry::from).collect())
    }

    async fn get_log_by_id(&self, id: LogEntryId) -> Result<LogEntry, LogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<LogRow> = logs::table
            .find(id.get())
            .select(LogRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_error)?;

        row.map(LogEntry::from)
            .ok_or_else(|| LogRepositoryError::not_found(id))
    }

    async fn insert_log(&self, entry: NewLogEntry) -> Result<LogEntryId, LogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = NewLogRow {
            log_time: entry.logged_at,
            log_message: &entry.message,
        };

        let id: i32 = diesel::insert_into(logs::table)
            .values(&row)
            .returning(logs::id)
            .get_result(&mut conn)
            .await
            .map_err(map_error)?;

        Ok(LogEntryId::new(id))
    }
}
