use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cinelog_api::config::Config;
use cinelog_api::db::{create_pool, PgStore};
use cinelog_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Connect to PostgreSQL and apply pending migrations
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;

    // Create the router with all routes
    let state = AppState::new(Arc::new(PgStore::new(pool)));
    let app = create_router(state);

    // Start the server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
