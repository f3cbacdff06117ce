// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! WeRise verifier: Telegram identity verification bot
//!
//! This crate provides the webhook backend of the WeRise Telegram bot,
//! which hands out verification links and ingests Telegram Passport data
//! for review.

pub mod config;
pub mod db;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::FirestoreDb;
use services::{BotService, Messenger, PassportDecryptor};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub bot: BotService,
    pub passport: Arc<PassportDecryptor>,
    pub messenger: Arc<dyn Messenger>,
}

impl AppState {
    /// Wire the bot service to the given storage, transport and key.
    pub fn new(
        config: Config,
        db: FirestoreDb,
        messenger: Arc<dyn Messenger>,
        passport: Arc<PassportDecryptor>,
    ) -> Self {
        let bot = BotService::new(&config, db.clone(), messenger.clone(), passport.clone());
        Self {
            config,
            db,
            bot,
            passport,
            messenger,
        }
    }
}
