use std::sync::Arc;

use sqlx::PgPool;

use evently_auth::{Argon2PasswordHasher, PasswordHasher, TokenService};
use evently_infra::store::{PostgresEventStore, PostgresRegistrationLedger, PostgresUserStore};
use evently_infra::{CredentialStore, EventStore, InMemoryStore, RegistrationLedger, UserStore};

/// Everything a handler may need, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub events: Arc<dyn EventStore>,
    pub registrations: Arc<dyn RegistrationLedger>,
    pub users: Arc<dyn UserStore>,
    pub credentials: CredentialStore,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
}

impl AppServices {
    /// Non-persistent wiring for dev/tests. All ports share one store.
    pub fn in_memory(tokens: Arc<dyn TokenService>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());

        Self {
            events: store.clone(),
            registrations: store.clone(),
            credentials: CredentialStore::new(store.clone(), hasher.clone()),
            users: store,
            hasher,
            tokens,
        }
    }

    /// Postgres-backed wiring. The schema must already exist.
    pub fn postgres(pool: PgPool, tokens: Arc<dyn TokenService>) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(PostgresUserStore::new(pool.clone()));
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());

        Self {
            events: Arc::new(PostgresEventStore::new(pool.clone())),
            registrations: Arc::new(PostgresRegistrationLedger::new(pool)),
            credentials: CredentialStore::new(users.clone(), hasher.clone()),
            users,
            hasher,
            tokens,
        }
    }
}
