// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client session lifecycle.
//!
//! Owns the current session, user, cached profile and derived journey
//! progress, and publishes them as a single [`SessionSnapshot`] through a
//! watch channel.
//!
//! Profile and progress fetches may overlap with later auth events or with
//! explicit refreshes. Each fetch records the session generation at dispatch
//! and its result is applied only while that generation is still current, so
//! a slow response can never resurrect state after a sign-out or user switch.
//!
//! Hydration is guarded separately by the auth epoch, which advances on every
//! auth event and sign-out. A hydrated session is installed only if no auth
//! transition was handled while `get_session` was outstanding.

use crate::db::ProfileStore;
use crate::models::{Profile, Session, User};
use crate::services::auth_provider::{AuthChange, AuthError, AuthProvider};
use crate::services::navigation::Navigator;
use crate::services::onboarding::OnboardingStaging;
use crate::services::progress::ProgressCalculator;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything observers see, published atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub user: Option<User>,
    pub profile: Option<Profile>,
    /// True until initial hydration has finished
    pub loading: bool,
    /// `1..=90` once a plan has been seen, 0 otherwise
    pub current_day: u32,
    /// `0..=100`
    pub journey_progress: u8,
}

impl SessionSnapshot {
    fn hydrating() -> Self {
        Self {
            session: None,
            user: None,
            profile: None,
            loading: true,
            current_day: 0,
            journey_progress: 0,
        }
    }

    fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    /// Reset per-user data to empty defaults.
    fn clear_user_data(&mut self) {
        self.profile = None;
        self.current_day = 0;
        self.journey_progress = 0;
    }
}

/// Collaborators the session manager depends on.
pub struct SessionDeps {
    pub auth: Arc<dyn AuthProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub progress: ProgressCalculator,
    pub staging: Arc<dyn OnboardingStaging>,
    pub navigator: Arc<dyn Navigator>,
}

pub struct SessionManager {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    progress: ProgressCalculator,
    staging: Arc<dyn OnboardingStaging>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    /// Bumped whenever the user identity changes (including to none)
    generation: AtomicU64,
    /// Bumped on every handled auth transition
    auth_epoch: AtomicU64,
    state: watch::Sender<SessionSnapshot>,
    listener: Mutex<Option<CancellationToken>>,
}

impl SessionManager {
    pub fn new(deps: SessionDeps, landing_path: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::hydrating());
        Self {
            auth: deps.auth,
            profiles: deps.profiles,
            progress: deps.progress,
            staging: deps.staging,
            navigator: deps.navigator,
            landing_path: landing_path.into(),
            generation: AtomicU64::new(0),
            auth_epoch: AtomicU64::new(0),
            state,
            listener: Mutex::new(None),
        }
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    // ─── Hydration & Events ──────────────────────────────────────

    /// Hydrate from the provider's current session.
    ///
    /// Always finishes with `loading == false`, even if the provider or a
    /// store failed along the way.
    ///
    /// The hydrated session is dropped if an auth event or sign-out was
    /// handled while it was being fetched.
    pub async fn initialize(&self) {
        let epoch = self.auth_epoch.load(Ordering::SeqCst);
        match self.auth.get_session().await {
            Ok(session) => {
                let user_id = session.as_ref().map(|s| s.user.id.clone());
                match self.hydrate_session(session, epoch) {
                    Some(generation) => {
                        if let Some(user_id) = user_id {
                            self.load_profile_for(&user_id, generation).await;
                            self.compute_progress_for(&user_id, generation).await;
                        }
                    }
                    None => {
                        tracing::debug!(epoch, "Auth changed during hydration, discarding hydrated session");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session hydration failed, continuing signed out");
            }
        }

        self.state.send_modify(|s| s.loading = false);
        tracing::debug!(generation = self.generation(), "Session hydration finished");
    }

    /// Handle one auth transition. Callers deliver events in arrival order
    /// and await each handler before the next.
    pub async fn on_auth_event(&self, change: AuthChange) {
        tracing::debug!(event = ?change.event, has_session = change.session.is_some(), "Auth event");

        let signed_in_user = match &change.session {
            Some(session) if change.event.is_interactive_sign_in() => Some(session.user.clone()),
            _ => None,
        };
        let generation = self.replace_session(change.session);

        if let Some(user) = signed_in_user {
            self.reconcile_staged(&user, generation).await;
            self.load_profile_for(&user.id, generation).await;
            self.compute_progress_for(&user.id, generation).await;
        }
    }

    /// Drain the provider's event stream on a background task until
    /// [`stop`](Self::stop) is called or the stream closes.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let cancel = CancellationToken::new();
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(previous) = listener.replace(cancel.clone()) {
                previous.cancel();
            }
        }

        let mut subscription = self.auth.subscribe();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    change = subscription.next() => match change {
                        Some(change) => manager.on_auth_event(change).await,
                        None => break,
                    },
                }
            }
            subscription.unsubscribe();
            tracing::debug!("Auth event listener stopped");
        })
    }

    /// Stop the background listener, if any.
    pub fn stop(&self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(cancel) = listener.take() {
                cancel.cancel();
            }
        }
    }

    // ─── Profile & Progress ──────────────────────────────────────

    /// Fetch the profile for `user_id`. Failures and absence keep the cached profile.
    pub async fn load_profile(&self, user_id: &str) {
        self.load_profile_for(user_id, self.generation()).await;
    }

    /// Recompute day and progress for `user_id`. Without a plan the last
    /// known values are kept.
    pub async fn compute_progress(&self, user_id: &str) {
        self.compute_progress_for(user_id, self.generation()).await;
    }

    /// Reload profile and progress for the current user; no-op when signed out.
    pub async fn refresh_profile(&self) {
        let (user_id, generation) = {
            let state = self.state.borrow();
            match state.user_id() {
                Some(id) => (id.to_string(), self.generation()),
                None => return,
            }
        };
        self.load_profile_for(&user_id, generation).await;
        self.compute_progress_for(&user_id, generation).await;
    }

    // ─── Sign-in / Sign-out ──────────────────────────────────────

    /// Sign in through the provider. State follows via the event stream.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.auth.sign_in_with_password(email, password).await
    }

    /// Sign out and clear all state, even if the provider call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.auth.sign_out().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Provider sign-out failed, clearing local session anyway");
        }

        self.replace_session(None);
        self.navigator.navigate(&self.landing_path);
        result
    }

    // ─── Internals ───────────────────────────────────────────────

    /// Install `session` for an auth transition in one observable update and
    /// return the generation that is current afterwards.
    fn replace_session(&self, session: Option<Session>) -> u64 {
        let mut generation = self.generation();
        self.state.send_modify(|state| {
            self.auth_epoch.fetch_add(1, Ordering::SeqCst);
            generation = self.install(state, session);
        });
        generation
    }

    /// Install a hydrated session unless the auth epoch moved past `epoch`.
    fn hydrate_session(&self, session: Option<Session>, epoch: u64) -> Option<u64> {
        let mut generation = None;
        self.state.send_if_modified(|state| {
            if self.auth_epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            generation = Some(self.install(state, session));
            true
        });
        generation
    }

    /// Runs inside the watch lock.
    fn install(&self, state: &mut SessionSnapshot, session: Option<Session>) -> u64 {
        let user = session.as_ref().map(|s| s.user.clone());
        let identity_changed = state.user_id() != user.as_ref().map(|u| u.id.as_str());

        let generation = if identity_changed {
            state.clear_user_data();
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.generation()
        };
        state.session = session;
        state.user = user;
        generation
    }

    /// Apply `update` only if `generation` is still current and the snapshot
    /// still belongs to `user_id`. Returns whether it was applied.
    fn apply_if_current(
        &self,
        user_id: &str,
        generation: u64,
        update: impl FnOnce(&mut SessionSnapshot),
    ) -> bool {
        self.state.send_if_modified(|state| {
            let current = self.generation.load(Ordering::SeqCst);
            if current != generation || state.user_id() != Some(user_id) {
                tracing::debug!(
                    user_id,
                    dispatched = generation,
                    current,
                    "Discarding stale session response"
                );
                return false;
            }
            update(state);
            true
        })
    }

    async fn load_profile_for(&self, user_id: &str, generation: u64) {
        match self.profiles.get_by_id(user_id).await {
            Ok(Some(profile)) => {
                self.apply_if_current(user_id, generation, |state| {
                    state.profile = Some(profile);
                });
            }
            Ok(None) => {
                tracing::debug!(user_id, "No profile found, keeping cached profile");
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Profile load failed, keeping cached profile");
            }
        }
    }

    async fn compute_progress_for(&self, user_id: &str, generation: u64) {
        match self.progress.compute(user_id, Utc::now()).await {
            Ok(Some(progress)) => {
                self.apply_if_current(user_id, generation, |state| {
                    state.current_day = progress.current_day;
                    state.journey_progress = progress.percent;
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Progress computation failed, keeping last values");
            }
        }
    }

    /// Move pre-authentication onboarding data into the user's profile.
    async fn reconcile_staged(&self, user: &User, generation: u64) {
        let Some(staged) = self.staging.load() else {
            return;
        };

        let now = Utc::now();
        let mut profile = match self.profiles.get_by_id(&user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => Profile::new(&user.id, now),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Could not read profile to reconcile staged onboarding");
                return;
            }
        };
        staged.apply_to(&mut profile, now);

        match self.profiles.upsert(profile).await {
            Ok(_) => {
                self.staging.clear();
                tracing::info!(user_id = %user.id, generation, "Reconciled staged onboarding into profile");
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to reconcile staged onboarding");
            }
        }
    }
}
