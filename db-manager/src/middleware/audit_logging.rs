//! Audit-logging decorator for [`UserRepository`].
//!
//! Each call writes two entries to the [`LogRepository`]: one before
//! delegating and one recording success or failure. Log writes are
//! best-effort. A failed write is reported through `tracing` and never
//! changes the delegated result.
//!
//! Failure entries for `get_*` and `insert_user` read a bare `failed`, while
//! `update_user_by_id` and `delete_user_by_id` append the error text. The
//! wording of every entry is part of the audit format.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::warn;

use crate::domain::ports::{LogRepository, UserRepository, UserRepositoryError};
use crate::domain::{NewLogEntry, NewUser, User, UserId, WriteOutcome};

/// Wraps a repository and narrates every call to an audit log.
#[derive(Clone)]
pub struct AuditLoggingUserRepository {
    log: Arc<dyn LogRepository>,
    next: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AuditLoggingUserRepository {
    /// Wrap `next`, writing audit entries to `log` stamped by `clock`.
    pub fn new(
        log: Arc<dyn LogRepository>,
        next: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { log, next, clock }
    }

    async fn record(&self, message: String) {
        let entry = NewLogEntry::new(fit_message(message), self.clock.utc());
        if let Err(error) = self.log.insert_log(entry).await {
            warn!(%error, "failed to insert audit log entry");
        }
    }
}

/// Longest message the `logs.log_message` column accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 255;

fn fit_message(message: String) -> String {
    if message.chars().count() <= MAX_MESSAGE_CHARS {
        return message;
    }
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}

fn status<T>(result: &Result<T, UserRepositoryError>) -> &'static str {
    if result.is_ok() { "succeeded" } else { "failed" }
}

fn detailed_status<T>(result: &Result<T, UserRepositoryError>) -> String {
    match result {
        Ok(_) => "succeeded".to_owned(),
        Err(error) => format!("failed: {error}"),
    }
}

#[async_trait]
impl UserRepository for AuditLoggingUserRepository {
    async fn get_users(&self) -> Result<Vec<User>, UserRepositoryError> {
        self.record("Getting all users".to_owned()).await;

        let result = self.next.get_users().await;

        self.record(format!("Getting all users {}", status(&result))).await;
        result
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, UserRepositoryError> {
        self.record(format!("Getting user by id: {id}")).await;

        let result = self.next.get_user_by_id(id).await;

        self.record(format!("Getting user by id: {id} -- {}", status(&result))).await;
        result
    }

    async fn insert_user(&self, user: &NewUser) -> Result<WriteOutcome, UserRepositoryError> {
        self.record("Trying to insert user".to_owned()).await;

        let result = self.next.insert_user(user).await;

        self.record(format!("Insert user {}", status(&result))).await;
        result
    }

    async fn update_user_by_id(
        &self,
        id: UserId,
        user: &NewUser,
    ) -> Result<WriteOutcome, UserRepositoryError> {
        self.record(format!("Trying to update user with id {id}")).await;

        let result = self.next.update_user_by_id(id, user).await;

        self.record(format!(
            "Updating user with id {id} {}",
            detailed_status(&result)
        ))
        .await;
        result
    }

    async fn delete_user_by_id(&self, id: UserId) -> Result<WriteOutcome, UserRepositoryError> {
        self.record(format!("Started deleting user with id {id}")).await;

        let result = self.next.delete_user_by_id(id).await;

        self.record(format!(
            "Deleting user with id {id} {}",
            detailed_status(&result)
        ))
        .await;
        result
    }
}
