// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.
//!
//! Provides the same operations as the managed backend for:
//! - Profiles (keyed by user ID)
//! - Plans (every generated plan per user)
//! - Progress events (append-only per user)
//! - Subscriptions (keyed by user ID)

use super::{PlanStore, ProfileStore, ProgressStore, SubscriptionStore};
use crate::error::AppError;
use crate::models::{Plan, Profile, ProgressRecord, ProgressStatus, SubscriptionRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory database. Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    profiles: Arc<DashMap<String, Profile>>,
    plans: Arc<DashMap<String, Vec<Plan>>>,
    progress: Arc<DashMap<String, Vec<ProgressRecord>>>,
    subscriptions: Arc<DashMap<String, SubscriptionRecord>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every operation fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Helper to return an error if offline.
    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamStore(
                "Store not reachable (offline mode)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_by_id(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.check_online()?;
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }

    async fn upsert(&self, profile: Profile) -> Result<Profile, AppError> {
        self.check_online()?;
        self.profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn get_active_or_latest(&self, user_id: &str) -> Result<Option<Plan>, AppError> {
        self.check_online()?;
        let Some(plans) = self.plans.get(user_id) else {
            return Ok(None);
        };

        if let Some(active) = plans.iter().find(|p| p.is_active) {
            return Ok(Some(active.clone()));
        }

        Ok(plans.iter().max_by_key(|p| p.generated_at).cloned())
    }

    async fn insert(&self, plan: Plan) -> Result<(), AppError> {
        self.check_online()?;
        self.plans.entry(plan.user_id.clone()).or_default().push(plan);
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn count_completed(&self, user_id: &str) -> Result<u64, AppError> {
        self.check_online()?;
        let count = self
            .progress
            .get(user_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.status == ProgressStatus::Completed)
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn append(&self, record: ProgressRecord) -> Result<(), AppError> {
        self.check_online()?;
        self.progress
            .entry(record.user_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<SubscriptionRecord>, AppError> {
        self.check_online()?;
        Ok(self.subscriptions.get(user_id).map(|s| s.clone()))
    }

    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, AppError> {
        self.check_online()?;
        self.subscriptions
            .insert(record.user_id.clone(), record.clone());
        Ok(record)
    }
}
