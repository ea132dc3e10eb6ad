// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Letter Exchange API Server
//!
//! Links user accounts to the remote social network, syncs followed contacts,
//! and stores letter metadata.

use letter_exchange::{
    config::Config,
    db::{FirestoreDb, InMemoryStore, UserRecordStore},
    services::{LinkingService, RemoteAccountClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Letter Exchange API");

    let store: Arc<dyn UserRecordStore> = if config.in_memory_store {
        tracing::warn!("Using in-memory store, data is lost on restart");
        Arc::new(InMemoryStore::new())
    } else {
        Arc::new(FirestoreDb::new(&config.gcp_project_id).await?)
    };

    let client = RemoteAccountClient::new(&config.remote);
    if client.is_configured() {
        tracing::info!("Remote account client configured");
    } else {
        tracing::warn!(
            "REMOTE_APP_ID, REMOTE_API_KEY or REMOTE_HOST missing; account linking disabled"
        );
    }

    let linking = LinkingService::new(client, store.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        linking,
    });

    // Build router
    let app = letter_exchange::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("letter_exchange=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
