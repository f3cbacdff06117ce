// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware for the review API.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Cookie an admin token may be sent in instead of the Authorization header.
pub const ADMIN_COOKIE: &str = "werise_admin_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (Telegram user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated admin extracted from JWT.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub telegram_id: String,
}

/// Middleware that requires a valid JWT belonging to an active admin user.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(ADMIN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(t) => t.to_string(),
            None => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data =
        decode::<Claims>(&token, &key, &validation).map_err(|_| StatusCode::UNAUTHORIZED)?;
    let telegram_id = token_data.claims.sub;

    // Admin rights are checked on every request so revocation is immediate.
    let user = state
        .db
        .get_user(&telegram_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load admin user");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !(user.is_admin && user.is_active) {
        tracing::warn!(telegram_id = %telegram_id, "Review API access by non-admin");
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AdminUser { telegram_id });

    Ok(next.run(request).await)
}

/// Create a JWT for an admin.
pub fn create_jwt(telegram_id: &str, signing_key: &[u8], ttl: Duration) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: telegram_id.to_string(),
        iat: now,
        exp: now + ttl.as_secs() as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_jwt_round_trip_claims() {
        let key = b"test_jwt_key_32_bytes_minimum!!";
        let token = create_jwt("42", key, Duration::from_secs(3600)).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(key),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(data.claims.sub, "42");
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
    }
}
