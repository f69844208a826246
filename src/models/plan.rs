// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity plans and append-only progress events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated 90-day activity plan. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub user_id: String,
    pub start_date: DateTime<Utc>,
    pub phase1_activities: Vec<String>,
    pub phase2_activities: Vec<String>,
    pub phase3_activities: Vec<String>,
    /// Explicitly flagged as the user's active plan
    #[serde(default)]
    pub is_active: bool,
    pub generated_at: DateTime<Utc>,
}

impl Plan {
    /// Total activity count across all three phases.
    pub fn total_activities(&self) -> usize {
        self.phase1_activities.len() + self.phase2_activities.len() + self.phase3_activities.len()
    }
}

/// Status carried by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Started,
    Skipped,
    Completed,
}

/// One append-only progress event. Only `Completed` counts toward progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub activity_id: String,
    pub status: ProgressStatus,
    pub recorded_at: DateTime<Utc>,
}
