// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Onboarding session core.
//!
//! This crate provides the client authentication session lifecycle
//! (hydration, auth-event reconciliation, derived journey progress), the
//! route gate that consumes it, and the fixed-window rate limiter that
//! protects the mutating profile endpoints.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ProfileStore;
use services::{AuthProvider, BillingService, RateLimiter};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: Arc<dyn AuthProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub billing: BillingService,
    pub rate_limiter: RateLimiter,
}
