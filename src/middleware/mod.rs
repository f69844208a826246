// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, throttling).

pub mod auth;
pub mod rate_limit;

pub use auth::require_auth;
pub use rate_limit::rate_limit;
