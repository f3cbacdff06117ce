// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification pages and the Passport request parameters.
//!
//! Flow:
//! 1. User taps the link from `/verify` and lands on the verification page
//! 2. The page script POSTs the token to `/telegram/passport-data`
//! 3. The returned parameters open the Telegram Passport form
//! 4. Telegram sends the browser back to the callback page

use crate::config::{VERIFY_CALLBACK_PATH, VERIFY_PATH};
use crate::error::{AppError, Result};
use crate::services::session::callback_url;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// CSP for the HTML pages: own script, stylesheet and fetch only.
pub const PAGE_CSP: &str = "default-src 'none'; script-src 'self'; style-src 'self'; \
connect-src 'self'; img-src 'self'; frame-ancestors 'none'";

const INDEX_HTML: &str = include_str!("../../templates/index.html");
const UNAUTHORIZED_HTML: &str = include_str!("../../templates/unauthorized.html");
const SUCCESS_HTML: &str = include_str!("../../templates/success.html");
const FAILURE_HTML: &str = include_str!("../../templates/failure.html");

/// Verification routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(VERIFY_PATH, get(verify_page))
        .route("/telegram/passport-data", post(passport_params))
        .route(VERIFY_CALLBACK_PATH, get(verify_callback))
}

fn page(status: StatusCode, html: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_SECURITY_POLICY, PAGE_CSP)],
        Html(html),
    )
        .into_response()
}

/// Landing page of a verification link.
async fn verify_page(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response> {
    if state.db.get_session(&token).await?.is_none() {
        tracing::info!("Verification page requested with invalid session");
        return Ok(page(StatusCode::UNAUTHORIZED, UNAUTHORIZED_HTML));
    }
    Ok(page(StatusCode::OK, INDEX_HTML))
}

/// Passport parameter request body. Older clients send the token as a number.
#[derive(Deserialize, Validate, Debug)]
pub struct PassportDataRequest {
    #[serde(deserialize_with = "string_or_number")]
    #[validate(length(min = 1, max = 256))]
    pub token: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Token {
        Text(String),
        Number(i64),
    }

    Ok(match Token::deserialize(deserializer)? {
        Token::Text(s) => s,
        Token::Number(n) => n.to_string(),
    })
}

/// Parameters for the Telegram Passport SDK.
#[derive(Serialize, Debug)]
pub struct PassportParams {
    pub bot_id: i64,
    pub public_key: String,
    pub callback_url: String,
    pub scope: serde_json::Value,
    pub nonce: String,
}

/// Requested Passport scope: an identity document with selfie, a proof of
/// address and the email address.
fn passport_scope() -> serde_json::Value {
    json!({
        "data": [
            {"type": "id_document", "selfie": true},
            "address_document",
            "email"
        ],
        "v": 1
    })
}

async fn passport_params(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<PassportDataRequest>, JsonRejection>,
) -> Result<Json<PassportParams>> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    body.validate()?;

    if state.db.get_session(&body.token).await?.is_none() {
        return Err(AppError::InvalidToken);
    }

    Ok(Json(PassportParams {
        bot_id: state.config.bot_id,
        public_key: state.passport.public_key_pem().to_string(),
        callback_url: callback_url(&state.config.backend_url, &body.token),
        scope: passport_scope(),
        nonce: body.token,
    }))
}

#[derive(Deserialize)]
struct CallbackParams {
    tg_passport: Option<String>,
}

/// Page Telegram redirects to once the Passport form is closed.
async fn verify_callback(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    if state.db.get_session(&token).await?.is_none() {
        return Ok(page(StatusCode::UNAUTHORIZED, UNAUTHORIZED_HTML));
    }

    let success = params
        .tg_passport
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("success"));

    tracing::info!(success, "Passport callback");

    if success {
        Ok(page(StatusCode::OK, SUCCESS_HTML))
    } else {
        Ok(page(StatusCode::OK, FAILURE_HTML))
    }
}
