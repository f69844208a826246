// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Render-or-redirect decision for a single page.
//!
//! The gate has no state of its own beyond whether it already dispatched a
//! redirect; transitions are driven solely by the `{user, loading}` pair.

use crate::models::User;
use crate::services::navigation::Navigator;
use crate::services::session::SessionSnapshot;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Waiting for initial hydration
    Loading,
    /// Return path persisted and navigation to the fallback dispatched
    Redirecting { return_to: String },
    /// Render the page
    Authorized,
    /// Navigation already dispatched; render nothing
    Blocked,
}

pub struct RouteGate {
    requested_path: String,
    access: Access,
    fallback_path: String,
    navigator: Arc<dyn Navigator>,
    redirect_dispatched: bool,
    state: GateState,
}

impl RouteGate {
    pub fn new(
        requested_path: impl Into<String>,
        access: Access,
        fallback_path: impl Into<String>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            requested_path: requested_path.into(),
            access,
            fallback_path: fallback_path.into(),
            navigator,
            redirect_dispatched: false,
            state: GateState::Loading,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn renders_children(&self) -> bool {
        self.state == GateState::Authorized
    }

    /// Advance the gate for the latest `{user, loading}` pair.
    pub fn observe(&mut self, user: Option<&User>, loading: bool) -> &GateState {
        self.state = if loading {
            GateState::Loading
        } else if user.is_some() || self.access == Access::Public {
            self.redirect_dispatched = false;
            GateState::Authorized
        } else if !self.redirect_dispatched {
            self.navigator.remember_return_path(&self.requested_path);
            self.navigator.navigate(&self.fallback_path);
            self.redirect_dispatched = true;
            tracing::debug!(
                path = %self.requested_path,
                fallback = %self.fallback_path,
                "Unauthenticated visit, redirecting"
            );
            GateState::Redirecting {
                return_to: self.requested_path.clone(),
            }
        } else {
            GateState::Blocked
        };
        &self.state
    }

    pub fn observe_snapshot(&mut self, snapshot: &SessionSnapshot) -> &GateState {
        self.observe(snapshot.user.as_ref(), snapshot.loading)
    }

    /// Follow session snapshots until hydration has finished, returning the
    /// first settled state.
    pub async fn settle(&mut self, updates: &mut watch::Receiver<SessionSnapshot>) -> GateState {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            if self.observe_snapshot(&snapshot) != &GateState::Loading {
                return self.state.clone();
            }
            if updates.changed().await.is_err() {
                return self.state.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::navigation::{ChannelNavigator, Navigation};

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_loading_then_authorized() {
        let (navigator, mut rx) = ChannelNavigator::new();
        let mut gate = RouteGate::new("/dashboard", Access::Authenticated, "/auth", Arc::new(navigator));

        assert_eq!(gate.observe(None, true), &GateState::Loading);
        assert!(!gate.renders_children());

        let u = user();
        assert_eq!(gate.observe(Some(&u), false), &GateState::Authorized);
        assert!(gate.renders_children());
        assert!(rx.try_recv().is_err(), "no navigation for an authorized visit");
    }

    #[test]
    fn test_redirects_once_then_blocks() {
        let (navigator, mut rx) = ChannelNavigator::new();
        let mut gate = RouteGate::new("/plan/day/3", Access::Authenticated, "/auth", Arc::new(navigator));

        assert_eq!(
            gate.observe(None, false),
            &GateState::Redirecting {
                return_to: "/plan/day/3".to_string()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Navigation::RememberReturnPath("/plan/day/3".to_string())
        );
        assert_eq!(rx.try_recv().unwrap(), Navigation::Navigate("/auth".to_string()));

        assert_eq!(gate.observe(None, false), &GateState::Blocked);
        assert!(rx.try_recv().is_err(), "navigation dispatched only once");
    }

    #[test]
    fn test_public_page_renders_without_user() {
        let (navigator, _rx) = ChannelNavigator::new();
        let mut gate = RouteGate::new("/about", Access::Public, "/auth", Arc::new(navigator));
        assert_eq!(gate.observe(None, false), &GateState::Authorized);
    }

    #[test]
    fn test_user_after_block_authorizes() {
        let (navigator, _rx) = ChannelNavigator::new();
        let mut gate = RouteGate::new("/dashboard", Access::Authenticated, "/auth", Arc::new(navigator));
        gate.observe(None, false);
        gate.observe(None, false);

        let u = user();
        assert_eq!(gate.observe(Some(&u), false), &GateState::Authorized);
    }

    #[tokio::test]
    async fn test_settle_waits_for_hydration() {
        let (navigator, _rx) = ChannelNavigator::new();
        let mut gate = RouteGate::new("/dashboard", Access::Authenticated, "/auth", Arc::new(navigator));

        let loading = SessionSnapshot {
            session: None,
            user: None,
            profile: None,
            loading: true,
            current_day: 0,
            journey_progress: 0,
        };
        let (tx, mut rx) = watch::channel(loading);

        tokio::spawn(async move {
            tx.send_modify(|s| {
                s.loading = false;
                s.user = Some(user());
            });
            // Keep the sender alive until the gate has observed the update.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        });

        assert_eq!(gate.settle(&mut rx).await, GateState::Authorized);
    }
}
