// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod passport;
pub mod session;
pub mod telegram;
pub mod user;
pub mod verification;

pub use passport::{Credentials, ElementType, EncryptedPassportElement, PassportData};
pub use session::Session;
pub use telegram::{ChatKind, Message, TelegramUser, Update};
pub use user::{User, UserUpdate};
pub use verification::{TelegramVerification, VerificationStatus};
