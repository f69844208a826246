// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Profile record owned by the profile store (document ID is the user ID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    /// Classification label assigned from survey answers (opaque here)
    pub persona: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, unknown>"))]
    #[serde(default)]
    pub survey_answers: Map<String, Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, unknown>"))]
    #[serde(default)]
    pub preferences: Map<String, Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile for a user who has not filled anything in yet.
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            persona: None,
            survey_answers: Map::new(),
            preferences: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
