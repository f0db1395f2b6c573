//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod log_repository;
mod transaction_manager;
mod user_repository;

#[cfg(test)]
pub use log_repository::MockLogRepository;
pub use log_repository::{FixtureLogRepository, LogRepository, LogRepositoryError};
pub use transaction_manager::{Transaction, TransactionError, TransactionManager};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
