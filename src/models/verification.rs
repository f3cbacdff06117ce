// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity verification record assembled from Telegram Passport data.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::now_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// Verification record stored in Firestore, keyed by Telegram id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TelegramVerification {
    pub id: String,
    pub telegram_id: String,
    pub phone_number: Option<String>,
    /// Passport or internal passport document data
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub passport_data: Option<serde_json::Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub personal_details: Option<serde_json::Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub driver_license: Option<serde_json::Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub identity_card: Option<serde_json::Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub utility_bill: Option<serde_json::Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub bank_statement: Option<serde_json::Value>,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub address: Option<serde_json::Value>,
    /// Rental agreements and registrations, keyed by element type
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub address_documents: Option<serde_json::Value>,
    /// Stored file paths of the document scans
    pub identity_front_side: Option<String>,
    pub identity_reverse_side: Option<String>,
    pub selfie: Option<String>,

    // Review fields
    #[serde(default)]
    pub status: VerificationStatus,
    pub rejected_reason: Option<String>,
    pub approved_at: Option<String>,
    pub rejected_at: Option<String>,

    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

impl TelegramVerification {
    pub fn new(telegram_id: impl Into<String>) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            telegram_id: telegram_id.into(),
            phone_number: None,
            passport_data: None,
            personal_details: None,
            driver_license: None,
            identity_card: None,
            utility_bill: None,
            bank_statement: None,
            address: None,
            address_documents: None,
            identity_front_side: None,
            identity_reverse_side: None,
            selfie: None,
            status: VerificationStatus::Pending,
            rejected_reason: None,
            approved_at: None,
            rejected_at: None,
            created_at: now.clone(),
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Put the record back into the review queue after a resubmission.
    pub fn reset_review(&mut self) {
        self.status = VerificationStatus::Pending;
        self.rejected_reason = None;
        self.approved_at = None;
        self.rejected_at = None;
        self.updated_at = now_rfc3339();
    }

    pub fn approve(&mut self) {
        let now = now_rfc3339();
        self.status = VerificationStatus::Approved;
        self.rejected_reason = None;
        self.rejected_at = None;
        self.approved_at = Some(now.clone());
        self.updated_at = now;
    }

    pub fn reject(&mut self, reason: String) {
        let now = now_rfc3339();
        self.status = VerificationStatus::Rejected;
        self.rejected_reason = Some(reason);
        self.approved_at = None;
        self.rejected_at = Some(now.clone());
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_transitions() {
        let mut v = TelegramVerification::new("42");
        assert_eq!(v.status, VerificationStatus::Pending);

        v.reject("blurry selfie".to_string());
        assert_eq!(v.status, VerificationStatus::Rejected);
        assert!(v.rejected_at.is_some());

        v.approve();
        assert_eq!(v.status, VerificationStatus::Approved);
        assert!(v.rejected_reason.is_none());
        assert!(v.rejected_at.is_none());
        assert!(v.approved_at.is_some());

        v.reset_review();
        assert_eq!(v.status, VerificationStatus::Pending);
        assert!(v.approved_at.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(VerificationStatus::Approved).unwrap();
        assert_eq!(json, "approved");
    }
}
