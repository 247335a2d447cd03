//! Storage ports and their adapters.
//!
//! ## Ports
//!
//! - [`EventStore`]: event rows, with ownership-guarded writes
//! - [`RegistrationLedger`]: the `(event, user)` attendance pairs
//! - [`UserStore`]: login identities
//!
//! ## Atomicity
//!
//! Each guarded operation reads the owner and writes inside one unit of work
//! (a transaction for Postgres, one write lock for the in-memory store). A
//! failed ownership check or validation leaves storage untouched.

use async_trait::async_trait;
use thiserror::Error;

use evently_auth::{AuthzError, StoredCredentials};
use evently_core::{Email, EventId, UserId};
use evently_events::{Event, EventDetails, EventPatch, Registration};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::{PostgresEventStore, PostgresRegistrationLedger, PostgresUserStore};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("not registered")]
    NotRegistered,

    /// The acting user has no row, e.g. deleted after its token was issued.
    #[error("unknown user")]
    UnknownUser,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// Infrastructure failure. The detail is for logs only.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A user row about to be inserted. The password is already digested.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: Email,
    pub password_digest: String,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Event persistence.
///
/// `update`, `patch` and `delete` take the acting user and run the ownership
/// gate against the row as read inside the same unit of work as the write.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event owned by `owner` and register the owner for it.
    async fn create(&self, owner: UserId, details: EventDetails) -> StoreResult<Event>;

    async fn get_by_id(&self, id: EventId) -> StoreResult<Event>;

    /// All current events, ascending by id.
    async fn list_all(&self) -> StoreResult<Vec<Event>>;

    /// Replace every editable field. Owner and id are kept.
    async fn update(&self, id: EventId, actor: UserId, details: EventDetails) -> StoreResult<Event>;

    /// Write exactly the fields carried by `patch`.
    ///
    /// An empty patch performs no write and returns the current row.
    async fn patch(&self, id: EventId, actor: UserId, patch: EventPatch) -> StoreResult<Event>;

    /// Remove the event; its registrations go with it.
    async fn delete(&self, id: EventId, actor: UserId) -> StoreResult<()>;
}

/// Attendance pairs. At most one row per `(event, user)`.
#[async_trait]
pub trait RegistrationLedger: Send + Sync {
    async fn is_registered(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool>;

    /// `NotFound` for an unknown event, `Conflict` when the pair exists.
    async fn register(&self, event_id: EventId, user_id: UserId) -> StoreResult<Registration>;

    /// `NotFound` for an unknown event, `NotRegistered` when the pair is absent.
    async fn cancel(&self, event_id: EventId, user_id: UserId) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<UserId>;

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<StoredCredentials>>;
}
