// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verification session: correlates a verification link with a Telegram user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::format_utc_rfc3339;

/// Marker stored in `Session::data` once Passport data has been ingested.
pub const PASSPORT_RECEIVED: &str = "passport_received";

/// Session stored in Firestore, keyed by token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub telegram_id: String,
    pub token: String,
    pub data: Option<String>,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

/// Marks a session whose Passport submission is being, or has been,
/// ingested. Created at most once per session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaim {
    pub token: String,
    pub telegram_id: String,
    pub created_at: String,
}

impl Session {
    pub fn new(
        telegram_id: String,
        token: String,
        data: Option<String>,
        now: DateTime<Utc>,
        ttl: std::time::Duration,
    ) -> Self {
        let created = format_utc_rfc3339(now);
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            telegram_id,
            token,
            data,
            expires_at: format_utc_rfc3339(now + ttl),
            created_at: created.clone(),
            updated_at: created,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Whether the session may still be used at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_deleted && self.expires_at > format_utc_rfc3339(now)
    }

    pub fn passport_received(&self) -> bool {
        self.data.as_deref() == Some(PASSPORT_RECEIVED)
    }
}
