// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mocked billing: checkout links and cancellation without a payment provider.

use crate::db::SubscriptionStore;
use crate::error::AppError;
use crate::models::{SubscriptionRecord, SubscriptionState};
use std::sync::Arc;

/// Plan offered when an upgrade request does not name one.
pub const DEFAULT_UPGRADE_PLAN: &str = "premium";

#[derive(Clone)]
pub struct BillingService {
    frontend_url: String,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl BillingService {
    pub fn new(frontend_url: impl Into<String>, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
            subscriptions,
        }
    }

    pub async fn subscription(&self, user_id: &str) -> Result<SubscriptionState, AppError> {
        Ok(SubscriptionState::from_record(
            self.subscriptions.get(user_id).await?,
        ))
    }

    /// Mock checkout URL on the frontend for the requested plan.
    pub fn checkout_url(&self, user_id: &str, plan_id: Option<&str>) -> String {
        let plan_id = plan_id.unwrap_or(DEFAULT_UPGRADE_PLAN);
        format!(
            "{}/checkout/mock?plan={}&user={}",
            self.frontend_url.trim_end_matches('/'),
            urlencoding::encode(plan_id),
            urlencoding::encode(user_id)
        )
    }

    /// Mark the user's subscription to end with the current period.
    pub async fn cancel(&self, user_id: &str) -> Result<SubscriptionRecord, AppError> {
        let mut record = match self.subscription(user_id).await? {
            SubscriptionState::Subscribed(record) => record,
            SubscriptionState::DefaultFree => {
                return Err(AppError::BadRequest(
                    "No active subscription to cancel".to_string(),
                ))
            }
        };

        record.cancel_at_period_end = true;
        let record = self.subscriptions.upsert(record).await?;
        tracing::info!(user_id, plan = %record.plan_id, "Subscription set to cancel at period end");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::SubscriptionStatus;

    fn service(store: &MemoryStore) -> BillingService {
        BillingService::new("http://localhost:5173/", Arc::new(store.clone()))
    }

    #[test]
    fn test_checkout_url_encodes_values() {
        let store = MemoryStore::new();
        let url = service(&store).checkout_url("user 1", Some("pro&annual"));
        assert_eq!(
            url,
            "http://localhost:5173/checkout/mock?plan=pro%26annual&user=user%201"
        );
        assert!(service(&store)
            .checkout_url("u1", None)
            .contains("plan=premium"));
    }

    #[tokio::test]
    async fn test_cancel_requires_subscription() {
        let store = MemoryStore::new();
        let billing = service(&store);
        assert!(matches!(
            billing.cancel("u1").await,
            Err(AppError::BadRequest(_))
        ));

        SubscriptionStore::upsert(
            &store,
            SubscriptionRecord {
                user_id: "u1".to_string(),
                plan_id: "premium".to_string(),
                status: SubscriptionStatus::Active,
                current_period_end: None,
                cancel_at_period_end: false,
            },
        )
        .await
        .unwrap();

        let record = billing.cancel("u1").await.unwrap();
        assert!(record.cancel_at_period_end);
        assert!(!billing.subscription("u1").await.unwrap().is_default_free());
    }
}
