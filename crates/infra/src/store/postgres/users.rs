use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use evently_auth::StoredCredentials;
use evently_core::UserId;

use super::error::map_sqlx_error;
use crate::store::{NewUser, StoreError, StoreResult, UserStore};

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: String,
}

impl From<UserRow> for StoredCredentials {
    fn from(row: UserRow) -> Self {
        StoredCredentials {
            user_id: UserId::new(row.id),
            email: row.email,
            password_digest: row.password,
        }
    }
}

/// Postgres-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn create_user(&self, user: NewUser) -> StoreResult<UserId> {
        let id: i64 = sqlx::query_scalar("INSERT INTO users (email, password) VALUES ($1, $2) RETURNING id")
            .bind(user.email.as_str())
            .bind(&user.password_digest)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match map_sqlx_error("create_user", e) {
                StoreError::Conflict(_) => StoreError::Conflict("email is already registered".to_string()),
                other => other,
            })?;

        Ok(UserId::new(id))
    }

    #[instrument(skip(self, email), err)]
    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<StoredCredentials>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, password FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("find_credentials", e))?;

        Ok(row.map(StoredCredentials::from))
    }
}
