// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Telegram updates.

use crate::models::Update;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header Telegram uses to echo the secret given to `setWebhook`.
pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Webhook routes.
pub fn routes(webhook_path: &str) -> Router<Arc<AppState>> {
    Router::new().route(webhook_path, post(handle_update))
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: &'static str,
}

fn secret_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(SECRET_TOKEN_HEADER)
        .map(|v| bool::from(v.as_bytes().ct_eq(expected.as_bytes())))
        .unwrap_or(false)
}

/// Handle an update pushed by Telegram (POST).
///
/// Processing errors are logged but still answered with 200 so Telegram
/// does not redeliver the update.
async fn handle_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    if let Some(expected) = &state.config.webhook_secret_token {
        if !secret_matches(&headers, expected) {
            tracing::warn!("Security Alert: Telegram webhook secret token mismatch");
            return (
                StatusCode::FORBIDDEN,
                Json(WebhookResponse { status: "forbidden" }),
            );
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse Telegram update");
            return (StatusCode::OK, Json(WebhookResponse { status: "ignored" }));
        }
    };

    tracing::debug!(
        update_id = update.update_id,
        kind = update.kind(),
        "Telegram update received"
    );

    if let Err(e) = state.bot.process_update(&update).await {
        tracing::error!(
            update_id = update.update_id,
            error = %e,
            "Failed to process Telegram update"
        );
    }

    (StatusCode::OK, Json(WebhookResponse { status: "ok" }))
}
