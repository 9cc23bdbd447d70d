mod api;
mod middleware;

use std::sync::Arc;

use oneview_core::{generate_demo_catalog, load_catalog_seed_or_embedded, AppConfig, InMemoryCatalog};
use oneview_db::PgCatalog;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = oneview_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting oneview-server");

    let state = build_state(&config).await?;
    let auth = AuthState::from_env(matches!(config.env, oneview_core::Environment::Development))?;
    let app = build_app(
        state,
        auth,
        RateLimitState::per_minute(config.rate_limit_per_minute),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Postgres when `DATABASE_URL` is set, otherwise an in-memory catalog seeded
/// from the demo catalog definition.
async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    if config.uses_database() {
        let pool = oneview_db::connect_pool_from_config(config).await?;
        let applied = oneview_db::run_migrations(&pool).await?;
        tracing::info!(applied, "database migrations complete");
        return Ok(AppState::from_backend(Arc::new(PgCatalog::new(pool)), "postgres"));
    }

    let seed = load_catalog_seed_or_embedded(&config.catalog_path)?;
    let demo = generate_demo_catalog(&seed, config.seed);
    tracing::info!(
        stores = demo.stores.len(),
        offerings = demo.offerings.len(),
        seed = config.seed,
        "using in-memory catalog"
    );
    Ok(AppState::from_backend(
        Arc::new(InMemoryCatalog::from_demo(demo)),
        "memory",
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
