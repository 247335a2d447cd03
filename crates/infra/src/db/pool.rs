use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use crate::config::DatabaseConfig;

/// Open the shared connection pool.
///
/// The pool is created once at startup and handed to every adapter that
/// needs it.
#[instrument(skip(config), fields(max = config.max_connections, min = config.min_connections), err)]
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await?;

    tracing::info!("database pool ready");
    Ok(pool)
}
