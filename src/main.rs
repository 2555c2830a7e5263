// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Accounts API Server
//!
//! User registration, JWT sessions and admin role management over a
//! SQLite-backed user store.

use accounts_api::{
    config::Config,
    db::SqliteUserStore,
    services::ensure_admin,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Accounts API");

    // Open the database and apply migrations
    let store = SqliteUserStore::connect(&config.database_url)
        .await
        .expect("Failed to open user database");
    tracing::info!("User database ready");

    let state = Arc::new(
        AppState::new(config.clone(), Arc::new(store)).expect("Failed to initialize services"),
    );

    if let Some(seed) = &config.admin_seed {
        ensure_admin(state.store.as_ref(), &state.hasher, seed).await?;
    }

    // Build router
    let app = accounts_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("accounts_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
