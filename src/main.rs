// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route-Tracker API Server
//!
//! Receives GPS pings from delivery vehicles and tracks their progress
//! along the imported courses.

use route_tracker::{
    config::Config,
    db::MemoryDb,
    services::{CourseLocks, DirectionsClient, RouteProvider},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Route-Tracker API");

    let directions: Option<Arc<dyn RouteProvider>> = match &config.directions_api_key {
        Some(key) => Some(Arc::new(DirectionsClient::new(key.clone()))),
        None => {
            tracing::warn!("GOOGLE_MAPS_API_KEY not set; trace generation disabled");
            None
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db: Arc::new(MemoryDb::new()),
        directions,
        course_locks: CourseLocks::new(),
    });

    // Build router
    let app = route_tracker::routes::create_router(state);

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

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("route_tracker=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
