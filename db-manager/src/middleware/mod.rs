//! Repository decorators and the function that chains them.
//!
//! A decorated repository is built as
//! caller → [`AuditLoggingUserRepository`] → [`TransactionalUserRepository`]
//! → storage backend. The logging layer sits outside the transaction, so
//! audit entries persist even when the business call rolls back.

mod audit_logging;
mod transactional;

use std::sync::Arc;

use mockable::Clock;
use tokio_util::sync::CancellationToken;

use crate::domain::ports::{LogRepository, TransactionManager, UserRepository};

pub use audit_logging::{AuditLoggingUserRepository, MAX_MESSAGE_CHARS};
pub use transactional::TransactionalUserRepository;

/// Collaborators needed to decorate a storage backend.
pub struct DecoratorParts {
    /// Opens transactions on the backend's connection.
    pub transactions: Arc<dyn TransactionManager>,
    /// Receives audit entries.
    pub log: Arc<dyn LogRepository>,
    /// Timestamps audit entries.
    pub clock: Arc<dyn Clock>,
    /// Aborts in-flight transactions when cancelled.
    pub cancellation: CancellationToken,
}

/// Compose the full decorator chain around `backend`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use db_manager::middleware::{decorate, DecoratorParts};
/// use db_manager::outbound::memory::InMemoryDatabase;
/// use mockable::DefaultClock;
/// use tokio_util::sync::CancellationToken;
///
/// let database = Arc::new(InMemoryDatabase::new());
/// let repository = decorate(
///     database.clone(),
///     DecoratorParts {
///         transactions: database.clone(),
///         log: database,
///         clock: Arc::new(DefaultClock),
///         cancellation: CancellationToken::new(),
///     },
/// );
/// # let _ = repository;
/// ```
pub fn decorate(backend: Arc<dyn UserRepository>, parts: DecoratorParts) -> Arc<dyn UserRepository> {
    let DecoratorParts {
        transactions,
        log,
        clock,
        cancellation,
    } = parts;
    let transactional = TransactionalUserRepository::new(transactions, backend, cancellation);
    Arc::new(AuditLoggingUserRepository::new(
        log,
        Arc::new(transactional),
        clock,
    ))
}
