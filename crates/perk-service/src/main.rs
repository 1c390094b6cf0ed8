//! Perk Service - HTTP API for the corporate points ledger
//!
//! This is the main entry point for the perk service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perk_ledger::BcryptHasher;
use perk_service::{create_router, AppState, ServiceConfig};
use perk_store::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,perk=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Perk Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        token_lifetime_hours = config.token_lifetime_hours,
        "Service configuration loaded"
    );

    // Connect to PostgreSQL and apply the schema
    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    store.apply_schema().await?;

    // Build app state
    let state = AppState::new(store, Arc::new(BcryptHasher::default()), config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
