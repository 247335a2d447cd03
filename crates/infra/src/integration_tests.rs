//! Port-contract tests shared by every storage backend.
//!
//! The in-memory store always runs. The Postgres adapters run as well when
//! `DATABASE_URL` is set; otherwise that test returns early.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use evently_auth::AuthzError;
    use evently_core::{Email, EventId, UserId};
    use evently_events::{EventDetails, EventPatch};

    use crate::config::DatabaseConfig;
    use crate::db;
    use crate::store::{
        EventStore, InMemoryStore, NewUser, PostgresEventStore, PostgresRegistrationLedger,
        PostgresUserStore, RegistrationLedger, StoreError, UserStore,
    };

    struct Backend {
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationLedger>,
        users: Arc<dyn UserStore>,
    }

    fn in_memory() -> Backend {
        let store = Arc::new(InMemoryStore::new());
        Backend {
            events: store.clone(),
            registrations: store.clone(),
            users: store,
        }
    }

    async fn postgres() -> Option<Backend> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = db::connect(&DatabaseConfig::new(url)).await.ok()?;
        db::ensure_schema(&pool).await.ok()?;

        Some(Backend {
            events: Arc::new(PostgresEventStore::new(pool.clone())),
            registrations: Arc::new(PostgresRegistrationLedger::new(pool.clone())),
            users: Arc::new(PostgresUserStore::new(pool)),
        })
    }

    fn test_details(name: &str) -> EventDetails {
        EventDetails::new(
            name,
            "daily sync",
            "room 4",
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        )
        .unwrap()
    }

    /// Emails unique per run so a shared database can be reused.
    async fn test_user(backend: &Backend, label: &str) -> UserId {
        let nonce = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        backend
            .users
            .create_user(NewUser {
                email: Email::parse(format!("{label}-{nonce}@example.com")).unwrap(),
                password_digest: "digest".to_string(),
            })
            .await
            .unwrap()
    }

    async fn run_contract(backend: Backend) {
        let owner = test_user(&backend, "owner").await;
        let guest = test_user(&backend, "guest").await;

        // create registers the owner
        let event = backend.events.create(owner, test_details("Standup")).await.unwrap();
        assert_eq!(event.owner_user_id, owner);
        assert!(backend.registrations.is_registered(event.id, owner).await.unwrap());
        assert_eq!(backend.events.get_by_id(event.id).await.unwrap(), event);
        assert!(backend.events.list_all().await.unwrap().contains(&event));

        // ownership gate leaves the row untouched
        let hijack = EventPatch {
            name: Some("Hijacked".to_string()),
            ..EventPatch::default()
        };
        assert_eq!(
            backend.events.patch(event.id, guest, hijack).await,
            Err(StoreError::Forbidden(AuthzError::NotOwner))
        );
        assert_eq!(backend.events.get_by_id(event.id).await.unwrap(), event);

        // empty patch is a no-op, sparse patch touches one column
        assert_eq!(
            backend.events.patch(event.id, owner, EventPatch::default()).await.unwrap(),
            event
        );
        let renamed = backend
            .events
            .patch(
                event.id,
                owner,
                EventPatch {
                    name: Some("Planning".to_string()),
                    ..EventPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Planning");
        assert_eq!(renamed.location, event.location);

        let updated = backend
            .events
            .update(event.id, owner, test_details("Retro"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Retro");
        assert_eq!(updated.owner_user_id, owner);

        // registration ledger
        backend.registrations.register(event.id, guest).await.unwrap();
        assert!(matches!(
            backend.registrations.register(event.id, guest).await,
            Err(StoreError::Conflict(_))
        ));
        backend.registrations.cancel(event.id, guest).await.unwrap();
        assert_eq!(
            backend.registrations.cancel(event.id, guest).await,
            Err(StoreError::NotRegistered)
        );

        // delete cascades
        backend.registrations.register(event.id, guest).await.unwrap();
        backend.events.delete(event.id, owner).await.unwrap();
        assert_eq!(backend.events.get_by_id(event.id).await, Err(StoreError::NotFound));
        assert!(!backend.registrations.is_registered(event.id, guest).await.unwrap());
        assert_eq!(
            backend.registrations.register(event.id, guest).await,
            Err(StoreError::NotFound)
        );

        assert_eq!(
            backend.events.get_by_id(EventId::new(i64::MAX)).await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn in_memory_store_honours_port_contract() {
        run_contract(in_memory()).await;
    }

    #[tokio::test]
    async fn postgres_store_honours_port_contract() {
        match postgres().await {
            Some(backend) => run_contract(backend).await,
            None => eprintln!("DATABASE_URL not set or unreachable; skipping"),
        }
    }
}
