use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use storegate_api::app::{self, services};
use storegate_api::config::ApiConfig;
use storegate_auth::InMemoryUserStore;
use storegate_infra::PostgresUserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storegate_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let services = match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.auth.store_timeout)
                .connect(url)
                .await
                .context("failed to connect to postgres")?;
            let store = Arc::new(PostgresUserStore::new(pool));
            store.ensure_schema().await.context("failed to apply users schema")?;
            services::build_services(config.auth.clone(), store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory user store (data is lost on exit)");
            services::build_services(config.auth.clone(), InMemoryUserStore::arc())
        }
    };

    let app = app::build_app(Arc::new(services));

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
    }
    tracing::info!("shutting down");
}
