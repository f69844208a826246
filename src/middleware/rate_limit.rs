// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Throttling for mutating requests.

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Identifier used when neither a user nor a client address is known.
const UNKNOWN_CALLER: &str = "anonymous";

/// Consult the rate limiter before any mutating request reaches its handler.
///
/// Must run after [`require_auth`](crate::middleware::require_auth) so the
/// caller is identified by user ID where possible.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_mutating(request.method()) {
        return next.run(request).await;
    }

    let identifier = caller_identifier(&request);
    if !state.rate_limiter.admit(&identifier) {
        tracing::warn!(identifier = %identifier, path = %request.uri().path(), "Rate limit exceeded");
        return AppError::RateLimited.into_response();
    }

    next.run(request).await
}

fn is_mutating(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// User ID when authenticated, otherwise the first forwarded client address.
fn caller_identifier(request: &Request) -> String {
    if let Some(user) = request.extensions().get::<AuthUser>() {
        return format!("user:{}", user.user_id);
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim())
        .filter(|ip| !ip.is_empty())
        .map(|ip| format!("ip:{}", ip))
        .unwrap_or_else(|| UNKNOWN_CALLER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_only_mutating_methods_are_limited() {
        assert!(is_mutating(&Method::POST));
        assert!(is_mutating(&Method::PUT));
        assert!(is_mutating(&Method::DELETE));
        assert!(!is_mutating(&Method::GET));
        assert!(!is_mutating(&Method::OPTIONS));
    }

    #[test]
    fn test_identifier_prefers_user() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(caller_identifier(&request), "ip:203.0.113.7");

        request.extensions_mut().insert(AuthUser {
            user_id: "u1".to_string(),
            email: "ada@example.com".to_string(),
        });
        assert_eq!(caller_identifier(&request), "user:u1");
    }

    #[test]
    fn test_identifier_fallback() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(caller_identifier(&request), UNKNOWN_CALLER);
    }
}
