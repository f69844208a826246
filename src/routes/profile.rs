// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Profile, SubscriptionRecord};
use crate::services::auth_provider::{AuthError, UserUpdate};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Profile routes (require authentication).
/// Auth and rate limiting are applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/profile/password", post(change_password))
        .route(
            "/api/profile/subscription",
            get(get_subscription).post(update_subscription),
        )
}

/// Response for simple mutations.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SuccessResponse {
    pub success: bool,
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    let profile = state
        .profiles
        .get_by_id(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user.user_id)))?;
    Ok(Json(profile))
}

// ─── Password ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    current_password: Option<String>,
    #[validate(length(min = 6, message = "newPassword is too short"))]
    new_password: Option<String>,
}

/// Change the caller's password after re-checking the current one.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>> {
    let (Some(current), Some(new)) = (
        payload.current_password.as_deref().filter(|p| !p.is_empty()),
        payload.new_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "currentPassword and newPassword are required".to_string(),
        ));
    };
    payload.validate()?;

    state
        .auth
        .verify_password(&user.email, current)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                AppError::BadRequest("Current password is incorrect".to_string())
            }
            other => other.into(),
        })?;

    state
        .auth
        .update_user(
            &user.user_id,
            UserUpdate {
                password: Some(new.to_string()),
                ..Default::default()
            },
        )
        .await?;

    tracing::info!(user_id = %user.user_id, "Password changed");
    Ok(Json(SuccessResponse { success: true }))
}

// ─── Subscription ────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscriptionResponse {
    pub subscription: SubscriptionRecord,
    /// True when no record exists and the free tier is reported
    pub is_default: bool,
}

async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SubscriptionResponse>> {
    let subscription = state.billing.subscription(&user.user_id).await?;
    let is_default = subscription.is_default_free();
    Ok(Json(SubscriptionResponse {
        subscription: subscription.into_record(&user.user_id),
        is_default,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionActionRequest {
    action: Option<String>,
    plan_id: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum SubscriptionActionResponse {
    Checkout {
        #[serde(rename = "checkoutUrl")]
        checkout_url: String,
    },
    Done(SuccessResponse),
}

async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SubscriptionActionRequest>,
) -> Result<Json<SubscriptionActionResponse>> {
    match payload.action.as_deref() {
        Some("upgrade") => {
            let checkout_url = state
                .billing
                .checkout_url(&user.user_id, payload.plan_id.as_deref());
            tracing::info!(user_id = %user.user_id, "Mock checkout created");
            Ok(Json(SubscriptionActionResponse::Checkout { checkout_url }))
        }
        Some("cancel") => {
            state.billing.cancel(&user.user_id).await?;
            Ok(Json(SubscriptionActionResponse::Done(SuccessResponse {
                success: true,
            })))
        }
        _ => Err(AppError::BadRequest(
            "action must be \"upgrade\" or \"cancel\"".to_string(),
        )),
    }
}
