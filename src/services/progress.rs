// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journey progress derived from the canonical plan and completed activities.

use crate::db::{PlanStore, ProgressStore};
use crate::error::AppError;
use crate::models::Plan;
use crate::time_utils::whole_days_between;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Length of a plan in days.
pub const JOURNEY_DAYS: u32 = 90;

/// Derived progress for a user with a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JourneyProgress {
    /// Day of the journey, always in `1..=90`
    pub current_day: u32,
    /// Completed share of all planned activities, `0..=100`
    pub percent: u8,
}

/// Day number for `now` in a plan starting at `start_date`, clamped to `1..=90`.
pub fn current_day(start_date: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let day = whole_days_between(start_date, now).saturating_add(1);
    day.clamp(1, JOURNEY_DAYS as i64) as u32
}

/// Rounded percentage of `total` activities completed. Zero when `total` is zero.
pub fn journey_percent(completed: u64, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total as u64);
    ((completed as f64 * 100.0) / total as f64).round() as u8
}

/// Progress for a plan given the number of completed activities.
pub fn progress_for(plan: &Plan, completed: u64, now: DateTime<Utc>) -> JourneyProgress {
    JourneyProgress {
        current_day: current_day(plan.start_date, now),
        percent: journey_percent(completed, plan.total_activities()),
    }
}

/// Reads plan and progress data to derive a user's [`JourneyProgress`].
#[derive(Clone)]
pub struct ProgressCalculator {
    plans: Arc<dyn PlanStore>,
    progress: Arc<dyn ProgressStore>,
}

impl ProgressCalculator {
    pub fn new(plans: Arc<dyn PlanStore>, progress: Arc<dyn ProgressStore>) -> Self {
        Self { plans, progress }
    }

    /// Compute progress for `user_id` as of `now`.
    ///
    /// Returns `Ok(None)` when the user has no plan.
    pub async fn compute(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<JourneyProgress>, AppError> {
        let Some(plan) = self.plans.get_active_or_latest(user_id).await? else {
            tracing::debug!(user_id, "No plan found, progress unchanged");
            return Ok(None);
        };

        let completed = self.progress.count_completed(user_id).await?;
        let progress = progress_for(&plan, completed, now);

        tracing::debug!(
            user_id,
            current_day = progress.current_day,
            percent = progress.percent,
            completed,
            total = plan.total_activities(),
            "Computed journey progress"
        );

        Ok(Some(progress))
    }
}
