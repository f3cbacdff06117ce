// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Path template of the verification landing page. `{token}` is replaced
/// with the session token.
pub const VERIFY_PATH: &str = "/telegram/verify/{token}";

/// Path template Telegram redirects to after the Passport form completes.
pub const VERIFY_CALLBACK_PATH: &str = "/telegram/verify/callback/{token}";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Public base URL of this service (used for webhook and verification links)
    pub backend_url: String,
    /// Path Telegram posts updates to
    pub webhook_path: String,
    /// Numeric bot id (prefix of the bot token)
    pub bot_id: i64,
    /// Bot username without '@', used when parsing `/cmd@bot` commands
    pub bot_username: String,
    /// PEM file holding the Passport RSA private key
    pub passport_private_key_path: PathBuf,
    /// Directory decrypted Passport files are written to
    pub passport_files_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Lifetime of a verification session
    pub session_ttl: Duration,
    /// How often expired sessions are purged
    pub session_sweep_interval: Duration,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Telegram bot token
    pub telegram_token: String,
    /// Shared secret Telegram echoes in `X-Telegram-Bot-Api-Secret-Token`
    pub webhook_secret_token: Option<String>,
    /// JWT signing key for review API tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let telegram_token = env::var("TELEGRAM_TOKEN")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("TELEGRAM_TOKEN"))?;
        let bot_id = bot_id_from_token(&telegram_token)?;

        Ok(Self {
            backend_url: env::var("BACKEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_URL"))?,
            webhook_path: env::var("WEBHOOK_PATH")
                .unwrap_or_else(|_| "/telegram/webhook".to_string()),
            bot_id,
            bot_username: env::var("BOT_USERNAME").unwrap_or_default(),
            passport_private_key_path: env::var("PASSPORT_PRIVATE_KEY_PATH")
                .unwrap_or_else(|_| "private.key".to_string())
                .into(),
            passport_files_dir: env::var("PASSPORT_FILES_DIR")
                .unwrap_or_else(|_| "data/passport".to_string())
                .into(),
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "static".to_string())
                .into(),
            session_ttl: Duration::from_secs(parse_or("SESSION_TTL_SECS", 86_400)),
            session_sweep_interval: Duration::from_secs(parse_or(
                "SESSION_SWEEP_INTERVAL_SECS",
                3_600,
            )),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            telegram_token,
            webhook_secret_token: env::var("WEBHOOK_SECRET_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            backend_url: "https://verify.example.com".to_string(),
            webhook_path: "/telegram/webhook".to_string(),
            bot_id: 123456,
            bot_username: "werise_test_bot".to_string(),
            passport_private_key_path: "private.key".into(),
            passport_files_dir: std::env::temp_dir().join("werise-verifier-test"),
            static_dir: "static".into(),
            session_ttl: Duration::from_secs(86_400),
            session_sweep_interval: Duration::from_secs(3_600),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            telegram_token: "123456:TEST-TOKEN".to_string(),
            webhook_secret_token: Some("test_webhook_secret".to_string()),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Full URL Telegram should deliver updates to.
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.backend_url, self.webhook_path)
    }
}

/// Extract the numeric bot id from a `<id>:<secret>` bot token.
pub fn bot_id_from_token(token: &str) -> Result<i64, ConfigError> {
    token
        .split_once(':')
        .and_then(|(id, _)| id.parse().ok())
        .ok_or(ConfigError::Invalid("TELEGRAM_TOKEN"))
}

fn parse_or(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Malformed environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("TELEGRAM_TOKEN", "987654:abcdef");
        env::set_var("BACKEND_URL", "https://bot.example.com/");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.bot_id, 987654);
        assert_eq!(config.backend_url, "https://bot.example.com");
        assert_eq!(config.webhook_path, "/telegram/webhook");
        assert_eq!(
            config.webhook_url(),
            "https://bot.example.com/telegram/webhook"
        );
    }

    #[test]
    fn test_bot_id_from_token() {
        assert_eq!(bot_id_from_token("543260180:AAE-xyz").unwrap(), 543260180);
        assert!(bot_id_from_token("no-colon").is_err());
        assert!(bot_id_from_token("abc:def").is_err());
    }
}
