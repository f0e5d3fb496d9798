//! SurrealDB implementation of [`UserRepository`].
//!
//! Users are stored with a numeric `user_id` allocated from the
//! `id_counter` table. Email uniqueness is enforced by the
//! `idx_user_email` index, so concurrent registrations of the same
//! address cannot both succeed.

use chrono::{DateTime, Utc};
use sso_core::error::SsoResult;
use sso_core::models::user::{CreateUser, User};
use sso_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::next_id;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserRow {
    user_id: i64,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.user_id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> SsoResult<i64> {
        let user_id = next_id(&self.db, "user").await?;

        let result = self
            .db
            .query(
                "CREATE user SET \
                 user_id = $user_id, \
                 email = $email, \
                 password_hash = $password_hash",
            )
            .bind(("user_id", user_id))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_statement(e, "idx_user_email", "user"))?;

        Ok(user_id)
    }

    async fn get_by_email(&self, email: &str) -> SsoResult<User> {
        let email_owned = email.to_string();

        let mut result = self
            .db
            .query(
                "SELECT user_id, email, password_hash, created_at FROM user \
                 WHERE email = $email LIMIT 1",
            )
            .bind(("email", email_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email_owned}"),
        })?;

        Ok(row.into())
    }
}
