// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification session tokens and the links built from them.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

use crate::config::{VERIFY_CALLBACK_PATH, VERIFY_PATH};
use crate::error::AppError;

/// Random bytes per token (43 characters once encoded).
pub const TOKEN_BYTES: usize = 32;

/// Generate an unguessable URL-safe session token.
pub fn generate_token() -> Result<String, AppError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Link the user opens to start verification.
pub fn verify_url(backend_url: &str, token: &str) -> String {
    format!(
        "{}{}",
        backend_url,
        VERIFY_PATH.replace("{token}", &urlencoding::encode(token))
    )
}

/// Where Telegram sends the browser once the Passport form is done.
pub fn callback_url(backend_url: &str, token: &str) -> String {
    format!(
        "{}{}",
        backend_url,
        VERIFY_CALLBACK_PATH.replace("{token}", &urlencoding::encode(token))
    )
}
