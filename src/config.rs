// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Frontend URL, used for CORS and mocked checkout links
    pub frontend_url: String,
    /// Where the client lands after sign-out
    pub landing_path: String,
    /// Where unauthenticated visitors of protected pages are sent
    pub auth_fallback_path: String,
    /// Lifetime of issued access tokens
    pub session_ttl_secs: i64,

    // --- Rate limiting ---
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_ms: u64,
    pub rate_limit_sweep_secs: u64,

    // --- Secrets ---
    /// JWT signing key for access tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key mixed into stored password digests
    pub password_pepper: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            landing_path: "/".to_string(),
            auth_fallback_path: "/auth".to_string(),
            session_ttl_secs: 3600,
            rate_limit_max_requests: 10,
            rate_limit_window_ms: 60_000,
            rate_limit_sweep_secs: 60,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            password_pepper: b"test_password_pepper".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_or("PORT", 8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            landing_path: env::var("LANDING_PATH").unwrap_or_else(|_| "/".to_string()),
            auth_fallback_path: env::var("AUTH_FALLBACK_PATH")
                .unwrap_or_else(|_| "/auth".to_string()),
            session_ttl_secs: parse_or("SESSION_TTL_SECS", 3600),

            rate_limit_max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", 10),
            rate_limit_window_ms: parse_or("RATE_LIMIT_WINDOW_MS", 60_000),
            rate_limit_sweep_secs: parse_or("RATE_LIMIT_SWEEP_SECS", 60u64).max(1),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            password_pepper: env::var("PASSWORD_PEPPER")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PASSWORD_PEPPER"))?
                .into_bytes(),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs)
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("PASSWORD_PEPPER", " pepper ");
        env::set_var("RATE_LIMIT_MAX_REQUESTS", "not-a-number");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.password_pepper, b"pepper");
        assert_eq!(config.port, 8080);
        // Unparsable values fall back to defaults
        assert_eq!(config.rate_limit_max_requests, 10);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
    }
}
