// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for the admin review API: authentication, listing and decisions.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::time::Duration;
use werise_verifier::middleware::auth::{create_jwt, ADMIN_COOKIE};
use werise_verifier::models::{TelegramVerification, VerificationStatus};

mod common;
use common::{create_test_app, TestApp};

const ADMIN: i64 = 1;
const ANA: i64 = 4242;

fn token_for(app: &TestApp, telegram_id: i64) -> String {
    create_jwt(
        &telegram_id.to_string(),
        &app.state.config.jwt_signing_key,
        Duration::from_secs(3600),
    )
    .unwrap()
}

async fn call(app: &TestApp, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token));
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let (status, _, bytes) = app.request(builder.body(body).unwrap()).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn setup() -> (TestApp, String) {
    let app = create_test_app();
    app.seed_user(ADMIN, "Root", true).await;
    app.seed_user(ANA, "Ana", false).await;
    app.state
        .db
        .upsert_verification(&TelegramVerification::new("4242"))
        .await
        .unwrap();
    let token = token_for(&app, ADMIN);
    (app, token)
}

#[tokio::test]
async fn test_requires_token() {
    let (app, _) = setup().await;

    let (status, _, _) = app.get("/api/verifications").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejects_bad_signature() {
    let (app, _) = setup().await;
    let forged = create_jwt("1", b"some_other_key_that_is_long_enough", Duration::from_secs(60)).unwrap();

    let (status, _) = call(&app, "GET", "/api/users", &forged, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejects_non_admin() {
    let (app, _) = setup().await;
    let token = token_for(&app, ANA);

    let (status, _) = call(&app, "GET", "/api/users", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleted_admin_loses_access() {
    let (app, token) = setup().await;
    app.state.db.delete_user("1").await.unwrap();

    let (status, _) = call(&app, "GET", "/api/users", &token, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cookie_auth() {
    let (app, token) = setup().await;

    let (status, _, _) = app
        .request(
            Request::builder()
                .uri("/api/users")
                .header("Cookie", format!("{}={}", ADMIN_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_users_pagination() {
    let (app, token) = setup().await;

    let (status, body) = call(&app, "GET", "/api/users?page=1&limit=1", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["limit"], 1);

    let (status, body) = call(&app, "GET", "/api/users", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let (status, _) = call(&app, "GET", "/api/users?page=0", &token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, "GET", "/api/users?limit=101", &token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_verifications_by_status() {
    let (app, token) = setup().await;
    let mut approved = TelegramVerification::new("99");
    approved.approve();
    app.state.db.upsert_verification(&approved).await.unwrap();

    let (_, all) = call(&app, "GET", "/api/verifications", &token, None).await;
    let (_, pending) = call(&app, "GET", "/api/verifications?status=pending", &token, None).await;
    let (status, _) = call(&app, "GET", "/api/verifications?status=bogus", &token, None).await;

    assert_eq!(all["verifications"].as_array().unwrap().len(), 2);
    let pending = pending["verifications"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["telegram_id"], "4242");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_verification() {
    let (app, token) = setup().await;

    let (status, body) = call(&app, "GET", "/api/verifications/4242", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    let (status, body) = call(&app, "GET", "/api/verifications/555", &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_approve_marks_user_verified_and_notifies() {
    let (app, token) = setup().await;

    let (status, body) = call(&app, "POST", "/api/verifications/4242/approve", &token, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert!(body["approved_at"].is_string());

    let stored = app.state.db.get_verification("4242").await.unwrap().unwrap();
    assert_eq!(stored.status, VerificationStatus::Approved);
    assert!(app.state.db.get_user("4242").await.unwrap().unwrap().is_verified);

    let sent = app.messenger.last().unwrap();
    assert_eq!(sent.chat_id, ANA);
    assert!(sent.text.contains("has been verified"));
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let (app, token) = setup().await;

    let (empty, _) = call(&app, "POST", "/api/verifications/4242/reject", &token, Some(json!({"reason": ""}))).await;
    let (blank, _) = call(&app, "POST", "/api/verifications/4242/reject", &token, Some(json!({"reason": "   "}))).await;
    let (too_long, _) = call(
        &app,
        "POST",
        "/api/verifications/4242/reject",
        &token,
        Some(json!({"reason": "x".repeat(1001)})),
    )
    .await;
    let (missing, _) = call(&app, "POST", "/api/verifications/4242/reject", &token, Some(json!({}))).await;

    assert_eq!(empty, StatusCode::BAD_REQUEST);
    assert_eq!(blank, StatusCode::BAD_REQUEST);
    assert_eq!(too_long, StatusCode::BAD_REQUEST);
    assert_eq!(missing, StatusCode::BAD_REQUEST);

    let stored = app.state.db.get_verification("4242").await.unwrap().unwrap();
    assert_eq!(stored.status, VerificationStatus::Pending);
}

#[tokio::test]
async fn test_reject_stores_reason_and_notifies() {
    let (app, token) = setup().await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/verifications/4242/reject",
        &token,
        Some(json!({"reason": "Selfie does not match document"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejected_reason"], "Selfie does not match document");
    assert!(!app.state.db.get_user("4242").await.unwrap().unwrap().is_verified);
    assert!(app
        .messenger
        .last()
        .unwrap()
        .text
        .contains("Reason: Selfie does not match document"));
}

#[tokio::test]
async fn test_review_unknown_verification() {
    let (app, token) = setup().await;

    let (status, _) = call(&app, "POST", "/api/verifications/555/approve", &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.messenger.sent().is_empty());
}
