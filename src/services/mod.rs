// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth_provider;
pub mod billing;
pub mod navigation;
pub mod onboarding;
pub mod progress;
pub mod rate_limiter;
pub mod route_gate;
pub mod session;

pub use auth_provider::{
    AuthChange, AuthError, AuthEvent, AuthProvider, AuthSubscription, MemoryAuthProvider,
    UserUpdate,
};
pub use billing::BillingService;
pub use navigation::{ChannelNavigator, Navigation, Navigator};
pub use onboarding::{MemoryStaging, OnboardingStaging, StagedOnboarding};
pub use progress::{JourneyProgress, ProgressCalculator};
pub use rate_limiter::{RateLimitPolicy, RateLimiter};
pub use route_gate::{Access, GateState, RouteGate};
pub use session::{SessionDeps, SessionManager, SessionSnapshot};
