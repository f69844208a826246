// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding data captured before the visitor has an account.

use crate::models::Profile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Mutex;

/// Survey results staged on the client until the first sign-in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedOnboarding {
    pub full_name: Option<String>,
    pub persona: Option<String>,
    #[serde(default)]
    pub survey_answers: Map<String, Value>,
}

impl StagedOnboarding {
    /// Merge into `profile`. Staged answers override stored answers with the
    /// same key; absent name/persona leave the stored values alone.
    pub fn apply_to(self, profile: &mut Profile, now: DateTime<Utc>) {
        profile.survey_answers.extend(self.survey_answers);
        if let Some(full_name) = self.full_name {
            profile.full_name = Some(full_name);
        }
        if let Some(persona) = self.persona {
            profile.persona = Some(persona);
        }
        profile.updated_at = now;
    }
}

/// Client-side staging area for pre-authentication data.
pub trait OnboardingStaging: Send + Sync {
    fn load(&self) -> Option<StagedOnboarding>;

    fn clear(&self);
}

/// Staging held in process memory.
#[derive(Default)]
pub struct MemoryStaging {
    staged: Mutex<Option<StagedOnboarding>>,
}

impl MemoryStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, onboarding: StagedOnboarding) {
        if let Ok(mut staged) = self.staged.lock() {
            *staged = Some(onboarding);
        }
    }
}

impl OnboardingStaging for MemoryStaging {
    fn load(&self) -> Option<StagedOnboarding> {
        self.staged.lock().ok().and_then(|s| s.clone())
    }

    fn clear(&self) {
        if let Ok(mut staged) = self.staged.lock() {
            *staged = None;
        }
    }
}
