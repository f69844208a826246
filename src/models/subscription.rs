// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription records (billing is mocked).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Plan identifier reported for users without a stored subscription.
pub const FREE_PLAN_ID: &str = "free";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
}

/// Stored subscription for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

/// What the store knows about a user's subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Subscribed(SubscriptionRecord),
    /// No record exists; the user is on the free tier.
    DefaultFree,
}

impl SubscriptionState {
    pub fn from_record(record: Option<SubscriptionRecord>) -> Self {
        match record {
            Some(record) => SubscriptionState::Subscribed(record),
            None => SubscriptionState::DefaultFree,
        }
    }

    pub fn is_default_free(&self) -> bool {
        matches!(self, SubscriptionState::DefaultFree)
    }

    /// Render as a record, synthesizing the free tier for `DefaultFree`.
    pub fn into_record(self, user_id: &str) -> SubscriptionRecord {
        match self {
            SubscriptionState::Subscribed(record) => record,
            SubscriptionState::DefaultFree => SubscriptionRecord {
                user_id: user_id.to_string(),
                plan_id: FREE_PLAN_ID.to_string(),
                status: SubscriptionStatus::Active,
                current_period_end: None,
                cancel_at_period_end: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_record_is_default_free() {
        let state = SubscriptionState::from_record(None);
        assert!(state.is_default_free());

        let record = state.into_record("u1");
        assert_eq!(record.plan_id, FREE_PLAN_ID);
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert!(!record.cancel_at_period_end);
    }

    #[test]
    fn test_stored_record_passes_through() {
        let stored = SubscriptionRecord {
            user_id: "u1".to_string(),
            plan_id: "premium".to_string(),
            status: SubscriptionStatus::Trialing,
            current_period_end: None,
            cancel_at_period_end: true,
        };
        let state = SubscriptionState::from_record(Some(stored.clone()));
        assert!(!state.is_default_free());
        assert_eq!(state.into_record("ignored"), stored);
    }
}
