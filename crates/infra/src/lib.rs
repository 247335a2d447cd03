//! Infrastructure layer: config, DB pool, storage adapters.

pub mod config;
pub mod credentials;
pub mod db;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use credentials::CredentialStore;
pub use store::{
    EventStore, InMemoryStore, NewUser, RegistrationLedger, StoreError, StoreResult, UserStore,
};
