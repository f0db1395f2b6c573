//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository and transaction ports, backed
//! by PostgreSQL through `diesel-async`.
//!
//! - The user repository and the transaction manager share one dedicated
//!   connection ([`SharedConnection`]), so repository statements run inside
//!   the transaction the decorator opened.
//! - The log repository draws from a `bb8` pool ([`DbPool`]) and commits each
//!   entry on its own.
//! - Diesel row structs (`models.rs`) and schema definitions (`schema.rs`)
//!   stay internal to this module.
//!
//! # Example
//!
//! ```ignore
//! use db_manager::outbound::persistence::{
//!     DbPool, DieselLogRepository, DieselUserRepository, PoolConfig, SharedConnection,
//! };
//!
//! let config = PoolConfig::new("postgres://localhost/mydb");
//! let connection = SharedConnection::establish(&config).await?;
//! let users = DieselUserRepository::new(connection.clone(), Arc::new(DefaultClock));
//! let logs = DieselLogRepository::new(DbPool::new(&config).await?);
//! ```

mod diesel_error_mapping;
mod diesel_log_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;
mod shared_connection;

pub use diesel_log_repository::DieselLogRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
pub use shared_connection::SharedConnection;
