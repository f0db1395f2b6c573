//! A single PostgreSQL connection shared by the user repository and the
//! transaction manager.
//!
//! Both the transactional decorator and [`DieselUserRepository`] receive a
//! clone of the same [`SharedConnection`], so statements issued by the
//! repository run inside whatever transaction the decorator opened.
//!
//! Two locks guard the connection:
//!
//! - the connection mutex, held for the duration of one statement;
//! - the transaction gate, held from `BEGIN` until `COMMIT`/`ROLLBACK`, which
//!   keeps concurrent callers from interleaving their transactions.
//!
//! A transaction dropped before it finished (its future was cancelled) marks
//! the connection dirty; the next `begin` rolls it back first.
//!
//! [`DieselUserRepository`]: super::DieselUserRepository

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, TransactionManager as _};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::domain::ports::{Transaction, TransactionError, TransactionManager};

use super::pool::{PoolConfig, PoolError};

/// Cloneable handle to one dedicated PostgreSQL connection.
#[derive(Clone)]
pub struct SharedConnection {
    connection: Arc<Mutex<AsyncPgConnection>>,
    gate: Arc<Mutex<()>>,
    dirty: Arc<AtomicBool>,
}

impl SharedConnection {
    /// Open the dedicated connection described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when the connection cannot be opened.
    pub async fn establish(config: &PoolConfig) -> Result<Self, PoolError> {
        let connection = config.establish().await?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            gate: Arc::new(Mutex::new(())),
            dirty: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Lock the connection for one statement.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, AsyncPgConnection> {
        self.connection.lock().await
    }
}

#[async_trait]
impl TransactionManager for SharedConnection {
    async fn begin(&self) -> Result<Box<dyn Transaction>, TransactionError> {
        let gate = Arc::clone(&self.gate).lock_owned().await;
        let mut conn = self.connection.lock().await;

        if self.dirty.swap(false, Ordering::SeqCst) {
            warn!("rolling back transaction abandoned by a cancelled call");
            if let Err(error) = AnsiTransactionManager::rollback_transaction(&mut *conn).await {
                debug!(%error, "abandoned transaction was already closed");
            }
        }

        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(|err| TransactionError::begin(err.to_string()))?;
        drop(conn);

        Ok(Box::new(PgTransaction {
            connection: Arc::clone(&self.connection),
            dirty: Arc::clone(&self.dirty),
            finished: false,
            _gate: gate,
        }))
    }
}

struct PgTransaction {
    connection: Arc<Mutex<AsyncPgConnection>>,
    dirty: Arc<AtomicBool>,
    finished: bool,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> Result<(), TransactionError> {
        let mut transaction = self;
        let mut conn = transaction.connection.lock().await;
        let committed = AnsiTransactionManager::commit_transaction(&mut *conn).await;
        if let Err(error) = committed {
            // Nothing may stay open after a failed COMMIT.
            if let Err(rollback_error) = AnsiTransactionManager::rollback_transaction(&mut *conn).await
            {
                debug!(error = %rollback_error, "rollback after failed commit");
            }
            drop(conn);
            transaction.finished = true;
            return Err(TransactionError::commit(error.to_string()));
        }
        drop(conn);
        transaction.finished = true;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TransactionError> {
        let mut transaction = self;
        let mut conn = transaction.connection.lock().await;
        let rolled_back = AnsiTransactionManager::rollback_transaction(&mut *conn).await;
        drop(conn);
        transaction.finished = true;
        rolled_back.map_err(|err| TransactionError::rollback(err.to_string()))
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.dirty.store(true, Ordering::SeqCst);
        }
    }
}
