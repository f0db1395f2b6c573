//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Statements run on a [`SharedConnection`], so when the repository is
//! wrapped by the transactional decorator every statement of one call lands
//! in that call's transaction. All values are bound parameters.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use std::sync::Arc;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{NewUser, User, UserId, WriteOutcome};

use super::diesel_error_mapping::map_diesel_error;
use super::models::{NewUserRow, UserRow, UserUpdate};
use super::schema::users;
use super::shared_connection::SharedConnection;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    connection: SharedConnection,
    clock: Arc<dyn Clock>,
}

impl DieselUserRepository {
    /// Create a repository on `connection`; `clock` stamps `registered_at`.
    pub fn new(connection: SharedConnection, clock: Arc<dyn Clock>) -> Self {
        Self { connection, clock }
    }
}

fn map_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn rows_affected(rows: usize) -> WriteOutcome {
    WriteOutcome::affected(u64::try_from(rows).unwrap_or(u64::MAX))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn get_users(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.connection.lock().await;

        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order_by(users::id.asc())
            .load(&mut *conn)
            .await
            .map_err(map_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, UserRepositoryError> {
        let mut conn = self.connection.lock().await;

        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut *conn)
            .await
            .optional()
            .map_err(map_error)?;

        row.map(User::from)
            .ok_or_else(|| UserRepositoryError::not_found(id))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<WriteOutcome, UserRepositoryError> {
        let mut conn = self.connection.lock().await;

        let new_row = NewUserRow {
            name: &user.name,
            email: &user.email,
            password: &user.password,
            registered_at: self.clock.utc(),
        };

        let id: i32 = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(users::id)
            .get_result(&mut *conn)
            .await
            .map_err(map_error)?;

        Ok(WriteOutcome::inserted(UserId::new(id)))
    }

    async fn update_user_by_id(
        &self,
        id: UserId,
        user: &NewUser,
    ) -> Result<WriteOutcome, UserRepositoryError> {
        let mut conn = self.connection.lock().await;

        let update = UserUpdate {
            name: &user.name,
            email: &user.email,
            password: &user.password,
            registered_at: self.clock.utc(),
        };

        let rows = diesel::update(users::table.find(id.get()))
            .set(&update)
            .execute(&mut *conn)
            .await
            .map_err(map_error)?;

        Ok(rows_affected(rows))
    }

    async fn delete_user_by_id(&self, id: UserId) -> Result<WriteOutcome, UserRepositoryError> {
        let mut conn = self.connection.lock().await;

        let rows = diesel::delete(users::table.find(id.get()))
            .execute(&mut *conn)
            .await
            .map_err(map_error)?;

        Ok(rows_affected(rows))
    }
}
