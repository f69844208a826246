// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod plan;
pub mod profile;
pub mod subscription;
pub mod user;

pub use plan::{Plan, ProgressRecord, ProgressStatus};
pub use profile::Profile;
pub use subscription::{SubscriptionRecord, SubscriptionState, SubscriptionStatus};
pub use user::{Session, User};
