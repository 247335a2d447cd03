//! Postgres-backed adapters.
//!
//! Every adapter holds a clone of the shared [`sqlx::PgPool`]. Ownership-guarded
//! writes lock the event row with `SELECT ... FOR UPDATE` so the gate decision
//! and the write it guards see the same owner.

mod error;
mod events;
mod registrations;
mod users;

pub use events::PostgresEventStore;
pub use registrations::PostgresRegistrationLedger;
pub use users::PostgresUserStore;
