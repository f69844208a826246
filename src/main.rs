// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding API Server
//!
//! Serves the profile password and subscription endpoints behind
//! access-token authentication and per-caller rate limiting.

use onboard_session::{
    config::Config,
    db::MemoryStore,
    services::{BillingService, MemoryAuthProvider, RateLimitPolicy, RateLimiter},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting onboarding API");

    let store = MemoryStore::new();
    let auth = Arc::new(MemoryAuthProvider::new(
        &config.jwt_signing_key,
        &config.password_pepper,
        config.session_ttl_secs,
    ));

    let rate_limiter = RateLimiter::new(RateLimitPolicy {
        max_requests: config.rate_limit_max_requests,
        window: config.rate_limit_window(),
    });
    rate_limiter.start(config.rate_limit_sweep_interval());
    tracing::info!(
        max_requests = config.rate_limit_max_requests,
        window_ms = config.rate_limit_window_ms,
        "Rate limiter started"
    );

    let billing = BillingService::new(config.frontend_url.clone(), Arc::new(store.clone()));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        auth,
        profiles: Arc::new(store),
        billing,
        rate_limiter: rate_limiter.clone(),
    });

    // Build router
    let app = onboard_session::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    rate_limiter.stop();
    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("onboard_session=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
