//! In-process storage adapter.
//!
//! [`InMemoryDatabase`] implements the user repository, the audit log, and
//! the transaction manager over one shared state, mirroring the PostgreSQL
//! adapters closely enough for decorator tests and database-free runs:
//!
//! - identifiers come from a sequence that is not rewound by rollback;
//! - a transaction snapshots the user table and restores it on rollback or
//!   when dropped unfinished;
//! - transactions are serialized through an async gate;
//! - audit entries bypass the snapshot, so they survive rollbacks.
//!
//! Failures can be injected with the `fail_*` helpers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::domain::ports::{
    LogRepository, LogRepositoryError, Transaction, TransactionError, TransactionManager,
    UserRepository, UserRepositoryError,
};
use crate::domain::{LogEntry, LogEntryId, NewLogEntry, NewUser, User, UserId, WriteOutcome};

type UserTable = BTreeMap<UserId, User>;

#[derive(Default)]
struct UserState {
    users: UserTable,
    last_id: i32,
}

#[derive(Default)]
struct Faults {
    next_call: Option<UserRepositoryError>,
    next_write_after_apply: Option<UserRepositoryError>,
    next_commit: Option<String>,
    log_writes: Option<LogRepositoryError>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared in-memory store for users and audit entries.
pub struct InMemoryDatabase {
    users: Arc<Mutex<UserState>>,
    logs: Mutex<Vec<LogEntry>>,
    gate: Arc<AsyncMutex<()>>,
    faults: Mutex<Faults>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDatabase {
    /// Create an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Create an empty store stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Arc::new(Mutex::new(UserState::default())),
            logs: Mutex::new(Vec::new()),
            gate: Arc::new(AsyncMutex::new(())),
            faults: Mutex::new(Faults::default()),
            clock,
        }
    }

    /// Fail the next user repository call with `error` before it touches data.
    pub fn fail_next_call(&self, error: UserRepositoryError) {
        lock(&self.faults).next_call = Some(error);
    }

    /// Apply the next insert, update, or delete, then report `error`.
    ///
    /// Used to check that a rollback discards writes made before a failure.
    pub fn fail_next_write_after_apply(&self, error: UserRepositoryError) {
        lock(&self.faults).next_write_after_apply = Some(error);
    }

    /// Fail the next commit with `message`; the transaction rolls back.
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        lock(&self.faults).next_commit = Some(message.into());
    }

    /// Make every audit write fail with `error` until cleared with `None`.
    pub fn fail_log_writes(&self, error: Option<LogRepositoryError>) {
        lock(&self.faults).log_writes = error;
    }

    /// Number of stored users, read outside any transaction.
    pub fn user_count(&self) -> usize {
        lock(&self.users).users.len()
    }

    fn check_call(&self) -> Result<(), UserRepositoryError> {
        match lock(&self.faults).next_call.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn finish_write(&self, outcome: WriteOutcome) -> Result<WriteOutcome, UserRepositoryError> {
        match lock(&self.faults).next_write_after_apply.take() {
            Some(error) => Err(error),
            None => Ok(outcome),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn get_users(&self) -> Result<Vec<User>, UserRepositoryError> {
        self.check_call()?;
        Ok(lock(&self.users).users.values().cloned().collect())
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, UserRepositoryError> {
        self.check_call()?;
        lock(&self.users)
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| UserRepositoryError::not_found(id))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<WriteOutcome, UserRepositoryError> {
        self.check_call()?;
        let id = {
            let mut state = lock(&self.users);
            state.last_id = state
                .last_id
                .checked_add(1)
                .ok_or_else(|| UserRepositoryError::query("identity sequence exhausted"))?;
            let id = UserId::new(state.last_id);
            state.users.insert(
                id,
                User {
                    id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    password: user.password.clone(),
                    registered_at: self.clock.utc(),
                },
            );
            id
        };
        self.finish_write(WriteOutcome::inserted(id))
    }

    async fn update_user_by_id(
        &self,
        id: UserId,
        user: &NewUser,
    ) -> Result<WriteOutcome, UserRepositoryError> {
        self.check_call()?;
        let rows = match lock(&self.users).users.get_mut(&id) {
            Some(stored) => {
                stored.name.clone_from(&user.name);
                stored.email.clone_from(&user.email);
                stored.password.clone_from(&user.password);
                stored.registered_at = self.clock.utc();
                1
            }
            None => 0,
        };
        self.finish_write(WriteOutcome::affected(rows))
    }

    async fn delete_user_by_id(&self, id: UserId) -> Result<WriteOutcome, UserRepositoryError> {
        self.check_call()?;
        let removed = lock(&self.users).users.remove(&id);
        self.finish_write(WriteOutcome::affected(u64::from(removed.is_some())))
    }
}

#[async_trait]
impl LogRepository for InMemoryDatabase {
    async fn get_logs(&self) -> Result<Vec<LogEntry>, LogRepositoryError> {
        Ok(lock(&self.logs).clone())
    }

    async fn get_log_by_id(&self, id: LogEntryId) -> Result<LogEntry, LogRepositoryError> {
        lock(&self.logs)
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .ok_or_else(|| LogRepositoryError::not_found(id))
    }

    async fn insert_log(&self, entry: NewLogEntry) -> Result<LogEntryId, LogRepositoryError> {
        if let Some(error) = lock(&self.faults).log_writes.clone() {
            return Err(error);
        }
        let mut logs = lock(&self.logs);
        let raw = i32::try_from(logs.len())
            .ok()
            .and_then(|len| len.checked_add(1))
            .ok_or_else(|| LogRepositoryError::query("log identity sequence exhausted"))?;
        let id = LogEntryId::new(raw);
        logs.push(LogEntry {
            id,
            logged_at: entry.logged_at,
            message: entry.message,
        });
        Ok(id)
    }
}

#[async_trait]
impl TransactionManager for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn Transaction>, TransactionError> {
        let gate = Arc::clone(&self.gate).lock_owned().await;
        let snapshot = lock(&self.users).users.clone();
        let fail_commit = lock(&self.faults).next_commit.take();
        Ok(Box::new(InMemoryTransaction {
            users: Arc::clone(&self.users),
            snapshot: Some(snapshot),
            fail_commit,
            _gate: gate,
        }))
    }
}

struct InMemoryTransaction {
    users: Arc<Mutex<UserState>>,
    snapshot: Option<UserTable>,
    fail_commit: Option<String>,
    _gate: OwnedMutexGuard<()>,
}

impl InMemoryTransaction {
    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            lock(&self.users).users = snapshot;
        }
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), TransactionError> {
        let mut transaction = self;
        if let Some(message) = transaction.fail_commit.take() {
            transaction.restore();
            return Err(TransactionError::commit(message));
        }
        transaction.snapshot = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TransactionError> {
        let mut transaction = self;
        transaction.restore();
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if self.snapshot.is_some() {
            debug!("in-memory transaction dropped unfinished; restoring snapshot");
            self.restore();
        }
    }
}
