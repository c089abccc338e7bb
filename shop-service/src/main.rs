use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::MigrationHarness;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shop_service::api::{create_router, AppState};
use shop_service::config::Config;
use shop_service::MIGRATIONS;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = Config::parse();

    // Run migrations first
    info!("Running database migrations...");
    let mut conn = PgConnection::establish(&config.database_url)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    drop(conn);
    info!("Migrations completed successfully");

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
    let pool = Pool::builder()
        .max_size(config.db_pool_size)
        .build(manager)
        .await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let app = create_router(AppState::new(pool, &config));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(
        port = config.port,
        upload_dir = %config.upload_dir.display(),
        checkout_timeout_ms = config.checkout_timeout_ms,
        "Shop service listening"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
