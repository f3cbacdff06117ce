// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Review API for admins.

use crate::error::{AppError, Result};
use crate::messages;
use crate::middleware::auth::AdminUser;
use crate::models::{TelegramVerification, User, UserUpdate, VerificationStatus};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require an admin JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/verifications", get(list_verifications))
        .route("/api/verifications/{telegram_id}", get(get_verification))
        .route(
            "/api/verifications/{telegram_id}/approve",
            post(approve_verification),
        )
        .route(
            "/api/verifications/{telegram_id}/reject",
            post(reject_verification),
        )
}

#[derive(Deserialize)]
struct PageQuery {
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    50
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub telegram_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            telegram_id: u.telegram_id,
            first_name: u.first_name,
            last_name: u.last_name,
            username: u.username,
            email: u.email,
            is_admin: u.is_admin,
            is_active: u.is_active,
            is_verified: u.is_verified,
            created_at: u.created_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
    pub page: u32,
    pub limit: u32,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<UsersResponse>> {
    let users = state.db.get_users(params.page, params.limit).await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        page: params.page,
        limit: params.limit,
    }))
}

// ─── Verifications ───────────────────────────────────────────

#[derive(Deserialize)]
struct VerificationsQuery {
    status: Option<VerificationStatus>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerificationsResponse {
    pub verifications: Vec<TelegramVerification>,
    pub page: u32,
    pub limit: u32,
}

async fn list_verifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerificationsQuery>,
) -> Result<Json<VerificationsResponse>> {
    let verifications = state
        .db
        .list_verifications(params.status, params.page, params.limit)
        .await?;

    Ok(Json(VerificationsResponse {
        verifications,
        page: params.page,
        limit: params.limit,
    }))
}

async fn load_verification(state: &AppState, telegram_id: &str) -> Result<TelegramVerification> {
    state
        .db
        .get_verification(telegram_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Verification {} not found", telegram_id)))
}

async fn get_verification(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<String>,
) -> Result<Json<TelegramVerification>> {
    Ok(Json(load_verification(&state, &telegram_id).await?))
}

/// Mark the user verified and let them know the review outcome.
///
/// Notification failures are logged; the review decision is already stored.
async fn apply_review(
    state: &AppState,
    telegram_id: &str,
    verified: bool,
    notice: impl FnOnce(&str) -> String,
) -> Result<()> {
    let user = match state
        .db
        .update_user(
            telegram_id,
            UserUpdate {
                is_verified: Some(verified),
                ..Default::default()
            },
        )
        .await
    {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => {
            tracing::warn!(telegram_id, "Reviewed verification has no active user");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let chat_id: i64 = match telegram_id.parse() {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!(telegram_id, "Non-numeric Telegram id, not notifying");
            return Ok(());
        }
    };

    if let Err(e) = state
        .messenger
        .send_message(chat_id, &notice(&user.first_name), None)
        .await
    {
        tracing::warn!(telegram_id, error = %e, "Failed to notify user of review outcome");
    }
    Ok(())
}

async fn approve_verification(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(telegram_id): Path<String>,
) -> Result<Json<TelegramVerification>> {
    let mut verification = load_verification(&state, &telegram_id).await?;
    verification.approve();
    state.db.upsert_verification(&verification).await?;

    tracing::info!(
        telegram_id = %telegram_id,
        reviewer = %admin.telegram_id,
        "Verification approved"
    );

    apply_review(&state, &telegram_id, true, messages::verification_approved).await?;
    Ok(Json(verification))
}

#[derive(Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

async fn reject_verification(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(telegram_id): Path<String>,
    body: std::result::Result<Json<RejectRequest>, JsonRejection>,
) -> Result<Json<TelegramVerification>> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    body.validate()?;
    let reason = body.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest("Reason must not be blank".to_string()));
    }

    let mut verification = load_verification(&state, &telegram_id).await?;
    verification.reject(reason.clone());
    state.db.upsert_verification(&verification).await?;

    tracing::info!(
        telegram_id = %telegram_id,
        reviewer = %admin.telegram_id,
        "Verification rejected"
    );

    apply_review(&state, &telegram_id, false, |name| {
        messages::verification_rejected(name, &reason)
    })
    .await?;
    Ok(Json(verification))
}
