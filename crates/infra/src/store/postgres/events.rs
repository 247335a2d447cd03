use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use evently_auth::authorize_owner_action;
use evently_core::{EventId, UserId};
use evently_events::{Event, EventDetails, EventField, EventPatch};

use super::error::map_sqlx_error;
use crate::store::{EventStore, StoreError, StoreResult};

const EVENT_COLUMNS: &str = "id, name, description, location, date_time, user_id";

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    name: String,
    description: String,
    location: String,
    date_time: DateTime<Utc>,
    user_id: i64,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: EventId::new(row.id),
            name: row.name,
            description: row.description,
            location: row.location,
            date_time: row.date_time,
            owner_user_id: UserId::new(row.user_id),
        }
    }
}

/// Postgres-backed [`EventStore`].
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock the event row and run the ownership gate against its current owner.
async fn lock_owned_event(
    conn: &mut PgConnection,
    id: EventId,
    actor: UserId,
    operation: &str,
) -> StoreResult<()> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM events WHERE id = $1 FOR UPDATE")
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

    let owner = owner.ok_or(StoreError::NotFound)?;
    authorize_owner_action(actor, UserId::new(owner))?;
    Ok(())
}

async fn fetch_event(conn: &mut PgConnection, id: EventId, operation: &str) -> StoreResult<Event> {
    let row: Option<EventRow> =
        sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

    row.map(Event::from).ok_or(StoreError::NotFound)
}

/// `UPDATE events SET <col> = $n, ... WHERE id = $m RETURNING ...`.
///
/// Column names come from [`EventField::column`]; values are always bound.
fn patch_statement(id: EventId, patch: &EventPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE events SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(name) = &patch.name {
            set.push(EventField::Name.column())
                .push_unseparated(" = ")
                .push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            set.push(EventField::Description.column())
                .push_unseparated(" = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(location) = &patch.location {
            set.push(EventField::Location.column())
                .push_unseparated(" = ")
                .push_bind_unseparated(location.clone());
        }
        if let Some(date_time) = patch.date_time {
            set.push(EventField::DateTime.column())
                .push_unseparated(" = ")
                .push_bind_unseparated(date_time);
        }
    }
    qb.push(" WHERE id = ")
        .push_bind(id.get())
        .push(format!(" RETURNING {EVENT_COLUMNS}"));
    qb
}

#[async_trait]
impl EventStore for PostgresEventStore {
    #[instrument(skip(self, details), fields(owner = %owner), err)]
    async fn create(&self, owner: UserId, details: EventDetails) -> StoreResult<Event> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_event", e))?;

        let row: EventRow = sqlx::query_as(&format!(
            "INSERT INTO events (name, description, location, date_time, user_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&details.name)
        .bind(&details.description)
        .bind(&details.location)
        .bind(details.date_time)
        .bind(owner.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_event", e))?;

        sqlx::query("INSERT INTO registrations (event_id, user_id) VALUES ($1, $2)")
            .bind(row.id)
            .bind(owner.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_event", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_event", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn get_by_id(&self, id: EventId) -> StoreResult<Event> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("get_event", e))?;
        fetch_event(&mut conn, id, "get_event").await
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> StoreResult<Vec<Event>> {
        let rows: Vec<EventRow> =
            sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list_events", e))?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    #[instrument(skip(self, details), fields(event_id = %id, actor = %actor), err)]
    async fn update(&self, id: EventId, actor: UserId, details: EventDetails) -> StoreResult<Event> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_event", e))?;

        lock_owned_event(&mut tx, id, actor, "update_event").await?;

        let row: EventRow = sqlx::query_as(&format!(
            "UPDATE events SET name = $2, description = $3, location = $4, date_time = $5 \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id.get())
        .bind(&details.name)
        .bind(&details.description)
        .bind(&details.location)
        .bind(details.date_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_event", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_event", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self, patch), fields(event_id = %id, actor = %actor, patch_fields = ?patch.fields()), err)]
    async fn patch(&self, id: EventId, actor: UserId, patch: EventPatch) -> StoreResult<Event> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("patch_event", e))?;

        lock_owned_event(&mut tx, id, actor, "patch_event").await?;

        let event = if patch.is_empty() {
            fetch_event(&mut tx, id, "patch_event").await?
        } else {
            let mut statement = patch_statement(id, &patch);
            statement
                .build_query_as::<EventRow>()
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("patch_event", e))?
                .into()
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("patch_event", e))?;

        Ok(event)
    }

    #[instrument(skip(self), fields(event_id = %id, actor = %actor), err)]
    async fn delete(&self, id: EventId, actor: UserId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;

        lock_owned_event(&mut tx, id, actor, "delete_event").await?;

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;

        Ok(())
    }
}
