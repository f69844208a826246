// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{Duration, Utc};
use onboard_session::config::Config;
use onboard_session::db::{MemoryStore, PlanStore, ProfileStore, ProgressStore};
use onboard_session::models::{Plan, ProgressRecord, ProgressStatus, Session};
use onboard_session::routes::create_router;
use onboard_session::services::{
    BillingService, ChannelNavigator, MemoryAuthProvider, MemoryStaging, Navigation,
    ProgressCalculator, RateLimitPolicy, RateLimiter, SessionDeps, SessionManager,
};
use onboard_session::services::AuthProvider;
use onboard_session::AppState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

#[allow(dead_code)]
pub const TEST_EMAIL: &str = "ada@example.com";
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct horse";

/// Create an auth provider using the test configuration keys.
#[allow(dead_code)]
pub fn test_auth() -> Arc<MemoryAuthProvider> {
    let config = Config::test_default();
    Arc::new(MemoryAuthProvider::new(
        &config.jwt_signing_key,
        &config.password_pepper,
        config.session_ttl_secs,
    ))
}

/// Register the test account and sign it in.
#[allow(dead_code)]
pub async fn signed_in(auth: &MemoryAuthProvider) -> Session {
    auth.sign_up(TEST_EMAIL, TEST_PASSWORD)
        .expect("Failed to register test account");
    auth.sign_in_with_password(TEST_EMAIL, TEST_PASSWORD)
        .await
        .expect("Failed to sign in test account")
}

/// A plan started `days_ago` days ago with `per_phase` activities in each phase.
#[allow(dead_code)]
pub fn test_plan(user_id: &str, days_ago: i64, per_phase: usize) -> Plan {
    let now = Utc::now();
    let phase = |p: usize| (0..per_phase).map(|i| format!("p{}-a{}", p, i)).collect();
    Plan {
        user_id: user_id.to_string(),
        start_date: now - Duration::days(days_ago),
        phase1_activities: phase(1),
        phase2_activities: phase(2),
        phase3_activities: phase(3),
        is_active: true,
        generated_at: now,
    }
}

/// Seed a plan plus `completed` completed activities for `user_id`.
#[allow(dead_code)]
pub async fn seed_progress(store: &MemoryStore, user_id: &str, days_ago: i64, per_phase: usize, completed: usize) {
    store
        .insert(test_plan(user_id, days_ago, per_phase))
        .await
        .expect("Failed to seed plan");
    for i in 0..completed {
        store
            .append(ProgressRecord {
                user_id: user_id.to_string(),
                activity_id: format!("p1-a{}", i),
                status: ProgressStatus::Completed,
                recorded_at: Utc::now(),
            })
            .await
            .expect("Failed to seed progress");
    }
}

/// Session manager wired to in-memory collaborators.
#[allow(dead_code)]
pub struct TestSession {
    pub manager: Arc<SessionManager>,
    pub navigation: UnboundedReceiver<Navigation>,
    pub staging: Arc<MemoryStaging>,
}

#[allow(dead_code)]
pub fn test_session(
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    plans: Arc<dyn PlanStore>,
    progress: Arc<dyn ProgressStore>,
) -> TestSession {
    let (navigator, navigation) = ChannelNavigator::new();
    let staging = Arc::new(MemoryStaging::new());
    let manager = SessionManager::new(
        SessionDeps {
            auth,
            profiles,
            progress: ProgressCalculator::new(plans, progress),
            staging: staging.clone(),
            navigator: Arc::new(navigator),
        },
        Config::test_default().landing_path,
    );
    TestSession {
        manager: Arc::new(manager),
        navigation,
        staging,
    }
}

/// Router plus handles on its collaborators.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub auth: Arc<MemoryAuthProvider>,
    pub store: MemoryStore,
}

/// Create a test app with in-memory dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_policy(RateLimitPolicy::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_policy(policy: RateLimitPolicy) -> TestApp {
    let config = Config::test_default();
    let store = MemoryStore::new();
    let auth = test_auth();
    let billing = BillingService::new(config.frontend_url.clone(), Arc::new(store.clone()));

    let state = Arc::new(AppState {
        config,
        auth: auth.clone(),
        profiles: Arc::new(store.clone()),
        billing,
        rate_limiter: RateLimiter::new(policy),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        auth,
        store,
    }
}
