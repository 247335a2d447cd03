use std::sync::Arc;

use anyhow::Context;

use evently_api::app::{AppServices, build_app};
use evently_auth::{Hs256TokenService, TokenService};
use evently_infra::{AppConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    evently_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    let tokens: Arc<dyn TokenService> = Arc::new(Hs256TokenService::new(config.jwt_secret()));

    let services = match &config.database {
        Some(database) => {
            let pool = db::connect(database)
                .await
                .context("failed to connect to database")?;
            db::ensure_schema(&pool)
                .await
                .context("failed to apply database schema")?;
            AppServices::postgres(pool, tokens)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            AppServices::in_memory(tokens)
        }
    };

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
