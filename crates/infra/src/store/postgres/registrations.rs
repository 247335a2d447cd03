use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use evently_core::{EventId, UserId};
use evently_events::Registration;

use super::error::map_sqlx_error;
use crate::store::{RegistrationLedger, StoreError, StoreResult};

/// Postgres-backed [`RegistrationLedger`].
///
/// The `(event_id, user_id)` primary key backs the pre-check: a racing
/// duplicate insert surfaces as a unique violation and maps to `Conflict`.
#[derive(Debug, Clone)]
pub struct PostgresRegistrationLedger {
    pool: PgPool,
}

impl PostgresRegistrationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Hold a key-share lock on the event so it cannot be deleted mid-operation.
async fn lock_event(conn: &mut PgConnection, id: EventId, operation: &str) -> StoreResult<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM events WHERE id = $1 FOR KEY SHARE")
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

    found.map(|_| ()).ok_or(StoreError::NotFound)
}

async fn registered(
    conn: &mut PgConnection,
    event_id: EventId,
    user_id: UserId,
    operation: &str,
) -> StoreResult<bool> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2)",
    )
    .bind(event_id.get())
    .bind(user_id.get())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error(operation, e))
}

#[async_trait]
impl RegistrationLedger for PostgresRegistrationLedger {
    #[instrument(skip(self), fields(event_id = %event_id, user_id = %user_id), err)]
    async fn is_registered(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("is_registered", e))?;
        registered(&mut conn, event_id, user_id, "is_registered").await
    }

    #[instrument(skip(self), fields(event_id = %event_id, user_id = %user_id), err)]
    async fn register(&self, event_id: EventId, user_id: UserId) -> StoreResult<Registration> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("register", e))?;

        lock_event(&mut tx, event_id, "register").await?;
        if registered(&mut tx, event_id, user_id, "register").await? {
            return Err(StoreError::Conflict(
                "user is already registered for this event".to_string(),
            ));
        }

        sqlx::query("INSERT INTO registrations (event_id, user_id) VALUES ($1, $2)")
            .bind(event_id.get())
            .bind(user_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("register", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("register", e))?;

        Ok(Registration::new(event_id, user_id))
    }

    #[instrument(skip(self), fields(event_id = %event_id, user_id = %user_id), err)]
    async fn cancel(&self, event_id: EventId, user_id: UserId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("cancel_registration", e))?;

        lock_event(&mut tx, event_id, "cancel_registration").await?;
        if !registered(&mut tx, event_id, user_id, "cancel_registration").await? {
            return Err(StoreError::NotRegistered);
        }

        let result = sqlx::query("DELETE FROM registrations WHERE event_id = $1 AND user_id = $2")
            .bind(event_id.get())
            .bind(user_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("cancel_registration", e))?;

        // A concurrent cancel may have won between the check and the delete.
        if result.rows_affected() == 0 {
            return Err(StoreError::NotRegistered);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("cancel_registration", e))?;

        Ok(())
    }
}
