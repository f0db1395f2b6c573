//! Process wiring: configuration, adapter construction and the run loop.
//!
//! [`run`] builds the storage adapters for the resolved target, wraps the
//! user repository in the decorator chain and drives the command loop on its
//! own task. A shutdown signal cancels the shared token, which aborts any
//! in-flight transaction and stops the loop before its next command.

mod config;
mod shutdown;

use std::env;
use std::io;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::ports::{LogRepository, TransactionManager, UserRepository};
use crate::inbound::cli::{CommandLoop, LoopExit};
use crate::middleware::{DecoratorParts, decorate};
use crate::outbound::memory::InMemoryDatabase;
use crate::outbound::persistence::{
    DbPool, DieselLogRepository, DieselUserRepository, MigrationError, PoolError,
    SharedConnection, run_migrations,
};

pub use config::{CliArgs, ConfigError, DatabaseTarget, StorageSettings, connection_string};
pub use shutdown::shutdown_signal;

/// Failures that stop the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Arguments or settings were unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The schema could not be brought up to date.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// A database connection could not be opened.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Terminal input or output failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The command loop task panicked.
    #[error("command loop task failed: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}

/// Storage adapters for one run, before decoration.
pub struct Storage {
    /// Undecorated user repository.
    pub users: Arc<dyn UserRepository>,
    /// Transactions on the user repository's connection.
    pub transactions: Arc<dyn TransactionManager>,
    /// Audit log store.
    pub log: Arc<dyn LogRepository>,
}

impl Storage {
    /// Build adapters for `target`, bootstrapping the schema for PostgreSQL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when migrations fail or a connection cannot be
    /// opened.
    pub async fn connect(
        target: &DatabaseTarget,
        settings: &StorageSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        match target {
            DatabaseTarget::InMemory => {
                info!("using in-memory storage");
                let database = Arc::new(InMemoryDatabase::with_clock(clock));
                Ok(Self {
                    users: database.clone(),
                    transactions: database.clone(),
                    log: database,
                })
            }
            DatabaseTarget::Postgres(url) => {
                run_migrations(url).await?;
                let config = settings.pool_config(url);
                let connection = SharedConnection::establish(&config).await?;
                let pool = DbPool::new(&config).await?;
                info!(pool_max_size = config.max_size(), "connected to PostgreSQL");
                Ok(Self {
                    users: Arc::new(DieselUserRepository::new(connection.clone(), clock)),
                    transactions: Arc::new(connection),
                    log: Arc::new(DieselLogRepository::new(pool)),
                })
            }
        }
    }
}

/// Run the interactive manager on stdin/stdout until quit, end of input or a
/// shutdown signal.
///
/// # Errors
///
/// Returns [`AppError`] for configuration, connection and terminal failures.
/// Repository errors raised by individual commands are printed by the loop
/// and never end the run.
pub async fn run(args: CliArgs) -> Result<LoopExit, AppError> {
    let settings = StorageSettings::load_layers()?;
    let target = DatabaseTarget::resolve(&args, &settings, env::var("DATABASE_URL").ok())?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let storage = Storage::connect(&target, &settings, Arc::clone(&clock)).await?;
    let cancellation = CancellationToken::new();

    let repository = decorate(
        storage.users,
        DecoratorParts {
            transactions: storage.transactions,
            log: Arc::clone(&storage.log),
            clock,
            cancellation: cancellation.clone(),
        },
    );

    let mut command_loop = CommandLoop::new(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        repository,
        storage.log,
        cancellation.clone(),
    );
    let mut task = tokio::spawn(async move { command_loop.run().await });

    let joined = tokio::select! {
        joined = &mut task => joined,
        () = shutdown_signal() => {
            cancellation.cancel();
            task.await
        }
    };

    let exit = joined.map_err(|err| AppError::Task {
        message: err.to_string(),
    })??;
    info!(?exit, "command loop finished");
    Ok(exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;

    #[tokio::test]
    async fn in_memory_storage_shares_one_store() {
        let settings = StorageSettings {
            pool_max_size: 1,
            connect_timeout_secs: 1,
            in_memory: Some(true),
        };
        let storage = Storage::connect(&DatabaseTarget::InMemory, &settings, Arc::new(DefaultClock))
            .await
            .expect("in-memory storage never fails");

        let repository = decorate(
            storage.users,
            DecoratorParts {
                transactions: storage.transactions,
                log: Arc::clone(&storage.log),
                clock: Arc::new(DefaultClock),
                cancellation: CancellationToken::new(),
            },
        );
        repository
            .insert_user(&NewUser::new("Alice", "alice@example.com", "pw"))
            .await
            .expect("insert should succeed");

        let logs = storage.log.get_logs().await.expect("logs should load");
        assert_eq!(logs.len(), 2);
    }
}
