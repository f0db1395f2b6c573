//! Port abstraction for user storage and the decorators layered over it.
//!
//! [`UserRepository`] is the single contract shared by the storage backend and
//! by every decorator. Each decorator holds the next link as an
//! `Arc<dyn UserRepository>`, so a chain is assembled by plain composition.

use async_trait::async_trait;

use crate::domain::{NewUser, User, UserId, WriteOutcome};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repositories and their decorators.
    pub enum UserRepositoryError {
        /// No row carries the requested identifier.
        NotFound { id: UserId } => "user {id} not found",
        /// Connection checkout, begin, or commit failed.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The call was aborted by a cancellation signal.
        Cancelled { operation: String } => "{operation} cancelled",
    }
}

impl UserRepositoryError {
    /// Whether this error reports a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Port for user record storage.
///
/// # Semantics
///
/// - [`get_users`](Self::get_users) returns an empty vector, not an error,
///   when there are no rows. Ordering is stable within one snapshot.
/// - [`get_user_by_id`](Self::get_user_by_id) fails with
///   [`UserRepositoryError::NotFound`] when no row matches.
/// - [`insert_user`](Self::insert_user) assigns the identifier and
///   registration timestamp; the outcome reports one affected row and the new
///   identifier.
/// - [`update_user_by_id`](Self::update_user_by_id) replaces name, email and
///   password and rewrites the timestamp. A missing row is a zero-affected
///   success, not an error.
/// - [`delete_user_by_id`](Self::delete_user_by_id) likewise reports zero
///   affected rows for a missing identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch every user.
    async fn get_users(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Fetch one user by identifier.
    async fn get_user_by_id(&self, id: UserId) -> Result<User, UserRepositoryError>;

    /// Insert a new user.
    async fn insert_user(&self, user: &NewUser) -> Result<WriteOutcome, UserRepositoryError>;

    /// Replace the editable fields of the user with identifier `id`.
    async fn update_user_by_id(
        &self,
        id: UserId,
        user: &NewUser,
    ) -> Result<WriteOutcome, UserRepositoryError>;

    /// Remove the user with identifier `id`.
    async fn delete_user_by_id(&self, id: UserId) -> Result<WriteOutcome, UserRepositoryError>;
}
