//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{LogEntry, LogEntryId, User, UserId};

use super::schema::{logs, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub registered_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            password: row.password,
            registered_at: row.registered_at,
        }
    }
}

/// Insertable struct for creating user records. The id is left to the
/// identity column.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub registered_at: DateTime<Utc>,
}

/// Changeset struct for replacing a user's editable fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserUpdate<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub registered_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Audit log models
// ---------------------------------------------------------------------------

/// Row struct for reading from the logs table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LogRow {
    pub id: i32,
    pub log_time: DateTime<Utc>,
    pub log_message: String,
}

impl From<LogRow> for LogEntry {
    fn from(row: LogRow) -> Self {
        Self {
            id: LogEntryId::new(row.id),
            logged_at: row.log_time,
            message: row.log_message,
        }
    }
}

/// Insertable struct for appending audit entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = logs)]
pub(crate) struct NewLogRow<'a> {
    pub log_time: DateTime<Utc>,
    pub log_message: &'a str,
}
