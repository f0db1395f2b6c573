//! Transactional decorator for [`UserRepository`].
//!
//! Every call runs in its own transaction: begin, delegate, then commit on
//! success or roll back on failure. There is no multi-call transaction. The
//! wrapped repository must execute on the same connection the
//! [`TransactionManager`] opens transactions on, which is what makes the
//! delegate's writes atomic.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::ports::{TransactionManager, UserRepository, UserRepositoryError};
use crate::domain::{NewUser, User, UserId, WriteOutcome};

/// Wraps a repository so each operation is one transaction.
#[derive(Clone)]
pub struct TransactionalUserRepository {
    transactions: Arc<dyn TransactionManager>,
    next: Arc<dyn UserRepository>,
    cancellation: CancellationToken,
}

impl TransactionalUserRepository {
    /// Wrap `next`, opening transactions through `transactions`.
    ///
    /// Cancelling `cancellation` aborts an in-flight call and rolls its
    /// transaction back; later calls fail fast with
    /// [`UserRepositoryError::Cancelled`].
    pub fn new(
        transactions: Arc<dyn TransactionManager>,
        next: Arc<dyn UserRepository>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            transactions,
            next,
            cancellation,
        }
    }

    async fn in_transaction<T, F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, UserRepositoryError>
    where
        F: Future<Output = Result<T, UserRepositoryError>> + Send,
        T: Send,
    {
        if self.cancellation.is_cancelled() {
            return Err(UserRepositoryError::cancelled(operation));
        }

        let transaction = self.transactions.begin().await?;

        let outcome = tokio::select! {
            biased;
            () = self.cancellation.cancelled() => Err(UserRepositoryError::cancelled(operation)),
            result = call => result,
        };

        match outcome {
            Ok(value) => {
                transaction.commit().await?;
                debug!(operation, "transaction committed");
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = transaction.rollback().await {
                    warn!(operation, error = %rollback_error, "rollback after failed call did not complete");
                } else {
                    debug!(operation, %error, "transaction rolled back");
                }
                Err(error)
            }
        }
    }
}

#[async_trait]
impl UserRepository for TransactionalUserRepository {
    async fn get_users(&self) -> Result<Vec<User>, UserRepositoryError> {
        self.in_transaction("get_users", self.next.get_users()).await
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, UserRepositoryError> {
        self.in_transaction("get_user_by_id", self.next.get_user_by_id(id)).await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<WriteOutcome, UserRepositoryError> {
        self.in_transaction("insert_user", self.next.insert_user(user)).await
    }

    async fn update_user_by_id(
        &self,
        id: UserId,
        user: &NewUser,
    ) -> Result<WriteOutcome, UserRepositoryError> {
        self.in_transaction("update_user_by_id", self.next.update_user_by_id(id, user)).await
    }

    async fn delete_user_by_id(&self, id: UserId) -> Result<WriteOutcome, UserRepositoryError> {
        self.in_transaction("delete_user_by_id", self.next.delete_user_by_id(id)).await
    }
}
