// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! All stored timestamps use the same fixed-width RFC3339 form so that
//! string comparison in Firestore queries matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in storage format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}
