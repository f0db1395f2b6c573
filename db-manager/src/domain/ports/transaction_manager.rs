//! Port for opening database transactions on a shared connection.
//!
//! The transactional decorator is the only caller of [`TransactionManager`].
//! Adapters must guarantee that a [`Transaction`] dropped without an explicit
//! `commit` or `rollback` (for example when its future is cancelled) is rolled
//! back before the connection runs another statement.

use async_trait::async_trait;

use super::define_port_error;
use super::user_repository::UserRepositoryError;

define_port_error! {
    /// Errors raised while opening or closing a transaction.
    pub enum TransactionError {
        /// `BEGIN` failed.
        Begin { message: String } => "failed to begin transaction: {message}",
        /// `COMMIT` failed; the transaction has been rolled back.
        Commit { message: String } => "failed to commit transaction: {message}",
        /// `ROLLBACK` failed.
        Rollback { message: String } => "failed to roll back transaction: {message}",
    }
}

impl From<TransactionError> for UserRepositoryError {
    fn from(error: TransactionError) -> Self {
        Self::connection(error.to_string())
    }
}

/// An open transaction. Consuming either method ends it.
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction. On failure the transaction is rolled back
    /// before the error is returned.
    async fn commit(self: Box<Self>) -> Result<(), TransactionError>;

    /// Roll the transaction back.
    async fn rollback(self: Box<Self>) -> Result<(), TransactionError>;
}

/// Port that starts transactions on the connection shared with the storage
/// backend.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Begin a transaction. Waits until no other transaction is open on the
    /// same connection.
    async fn begin(&self) -> Result<Box<dyn Transaction>, TransactionError>;
}
