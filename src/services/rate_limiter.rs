// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-window request admission keyed by caller identifier.
//!
//! Each identifier gets a counter that resets a fixed offset after the first
//! request following expiry. Bursts of up to twice the limit are possible at
//! window boundaries.
//!
//! State is local to this process. A horizontally scaled deployment needs a
//! shared counter store instead.

use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Counter state for one identifier within its current window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    /// Limit in force when the window opened
    pub max_requests: u32,
    pub window_reset_at: Instant,
}

/// Shortest sweep period accepted by [`RateLimiter::start`].
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Limits applied by [`RateLimiter::admit`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_millis(60_000),
        }
    }
}

/// Per-process fixed-window rate limiter.
///
/// Clones share the same counters and sweep task.
#[derive(Clone, Default)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, RateLimitEntry>>,
    policy: RateLimitPolicy,
    /// Cancels the background sweep, if one is running.
    sweeper: Arc<Mutex<Option<CancellationToken>>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Admit or reject one request using the configured policy.
    pub fn admit(&self, identifier: &str) -> bool {
        self.admit_with(identifier, self.policy.max_requests, self.policy.window)
    }

    /// Admit or reject one request with explicit limits.
    ///
    /// `max_requests == 0` rejects every call and never creates an entry.
    pub fn admit_with(&self, identifier: &str, max_requests: u32, window: Duration) -> bool {
        if max_requests == 0 {
            return false;
        }

        let now = Instant::now();

        // The entry guard holds the shard lock, so check-and-increment is atomic.
        let mut entry = self
            .entries
            .entry(identifier.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                max_requests,
                window_reset_at: now,
            });

        if entry.count == 0 || entry.window_reset_at <= now {
            *entry = RateLimitEntry {
                count: 1,
                max_requests,
                window_reset_at: now + window,
            };
            return true;
        }

        if entry.count >= max_requests {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Requests still admissible for `identifier` in its current window,
    /// measured against the limit the window was opened with.
    pub fn remaining(&self, identifier: &str) -> u32 {
        match self.entries.get(identifier) {
            Some(entry) if entry.window_reset_at > Instant::now() => {
                entry.max_requests.saturating_sub(entry.count)
            }
            _ => self.policy.max_requests,
        }
    }

    /// Number of tracked identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove entries whose window has already expired. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.window_reset_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Spawn the periodic sweep. Calling this while a sweep is running is a no-op.
    ///
    /// Periods shorter than [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn start(&self, interval: Duration) {
        let interval = if interval < MIN_SWEEP_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "Rate limiter sweep interval too short, using minimum"
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };

        let Ok(mut sweeper) = self.sweeper.lock() else {
            tracing::error!("Rate limiter sweeper lock poisoned");
            return;
        };
        if sweeper.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        *sweeper = Some(cancel.clone());

        let limiter = self.clone();
        tokio::spawn(async move {
            tracing::info!(
                interval_ms = interval.as_millis() as u64,
                "Rate limiter sweep started"
            );
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Rate limiter sweep stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = limiter.len(), "Swept expired rate limit entries");
                        }
                    }
                }
            }
        });
    }

    /// Stop the periodic sweep, if running.
    pub fn stop(&self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(cancel) = sweeper.take() {
                cancel.cancel();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .map(|s| s.is_some())
            .unwrap_or(false)
    }
}
