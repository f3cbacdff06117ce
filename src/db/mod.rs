//! Database layer (Firestore, with an in-memory backend for offline use).

pub mod firestore;
mod memory;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Verification sessions (keyed by token)
    pub const SESSIONS: &str = "sessions";
    /// One document per session whose Passport submission has been taken up
    pub const SESSION_CLAIMS: &str = "session_claims";
    pub const TELEGRAM_VERIFICATIONS: &str = "telegram_verifications";
}

/// Largest page size accepted by list operations.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Convert 1-indexed `page`/`limit` into an offset, rejecting values that
/// would underflow or overflow.
pub fn page_offset(page: u32, limit: u32) -> Result<u32, crate::error::AppError> {
    use crate::error::AppError;

    if page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }
    if limit < 1 || limit > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "Limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))
}
