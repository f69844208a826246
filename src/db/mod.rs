// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage contracts for the profile, plan, progress and subscription stores.
//!
//! The records themselves live in a managed backend; this crate only depends
//! on the operations below. [`MemoryStore`] implements all of them in-process.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Plan, Profile, ProgressRecord, SubscriptionRecord};
use async_trait::async_trait;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch exactly one profile by user ID.
    async fn get_by_id(&self, user_id: &str) -> Result<Option<Profile>, AppError>;

    /// Create or replace a profile, returning the stored record.
    async fn upsert(&self, profile: Profile) -> Result<Profile, AppError>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// The canonical plan: the one flagged active, otherwise the most
    /// recently generated, otherwise none.
    async fn get_active_or_latest(&self, user_id: &str) -> Result<Option<Plan>, AppError>;

    async fn insert(&self, plan: Plan) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Number of `Completed` progress events for the user.
    async fn count_completed(&self, user_id: &str) -> Result<u64, AppError>;

    async fn append(&self, record: ProgressRecord) -> Result<(), AppError>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<SubscriptionRecord>, AppError>;

    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, AppError>;
}
