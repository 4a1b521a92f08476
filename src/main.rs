// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ramadan Tracker API Server
//!
//! Serves fasting and prayer schedules, daily duas, live iftar countdowns,
//! and each user's daily ibadah tracker.

use ramadan_tracker::{
    config::{Config, StoreBackend},
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::{AuthService, GoogleIdTokenVerifier, StoreIdentityProvider},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Ramadan Tracker API");

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let google = match &config.google_client_id {
        Some(client_id) => Some(Arc::new(GoogleIdTokenVerifier::new(client_id.clone())?)),
        None => {
            tracing::info!("GOOGLE_CLIENT_ID not set; Google sign-in disabled");
            None
        }
    };
    let auth: Arc<dyn AuthService> = Arc::new(StoreIdentityProvider::new(store.clone(), google));

    tracing::info!(
        regions = ?config.regions,
        default_region = %config.default_region,
        ramadan_start = %config.ramadan_start,
        ramadan_end = %config.ramadan_end,
        "Schedule configuration loaded"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, auth.clone()));

    // Unsaved tracker edits are dropped when their user signs out
    state.trackers.evict_on_sign_out(auth.subscribe());

    // Build router
    let app = ramadan_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ramadan_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
