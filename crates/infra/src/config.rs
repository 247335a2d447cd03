//! Process configuration, read once at startup.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

/// Secret used when `JWT_SECRET` is unset. Local development only.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 5,
        }
    }
}

impl core::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,

    /// `None` when `JWT_SECRET` was not set and [`DEV_JWT_SECRET`] is in use.
    jwt_secret: Option<String>,

    /// `None` selects the in-memory backend.
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load from the environment, honouring a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let database = match get("DATABASE_URL") {
            Some(url) => {
                let mut db = DatabaseConfig::new(url);
                if let Some(raw) = get("DB_MAX_CONNECTIONS") {
                    db.max_connections = parse_count("DB_MAX_CONNECTIONS", &raw)?;
                }
                if let Some(raw) = get("DB_MIN_CONNECTIONS") {
                    db.min_connections = parse_count("DB_MIN_CONNECTIONS", &raw)?;
                }
                db.min_connections = db.min_connections.min(db.max_connections);
                Some(db)
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret: get("JWT_SECRET"),
            database,
        })
    }

    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEV_JWT_SECRET)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret.is_none()
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("uses_dev_secret", &self.uses_dev_secret())
            .field("database", &self.database)
            .finish()
    }
}

fn parse_count(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: raw.to_string(),
        })
}
