// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bot;
pub mod passport;
pub mod session;
pub mod sweeper;
pub mod telegram;
pub mod verification;

pub use bot::{BotService, Command};
pub use passport::PassportDecryptor;
pub use telegram::{InlineKeyboard, Messenger, TelegramClient, UrlButton};
pub use verification::{FileBatch, FileStore, IngestOutcome, VerificationService};
