// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bot application: dispatches Telegram updates to command handlers and
//! Passport ingestion.

use std::sync::Arc;
use std::time::Duration;

use teloxide::utils::command::{BotCommands, ParseError};

use super::passport::PassportDecryptor;
use super::session::{generate_token, verify_url};
use super::telegram::{Messenger, UrlButton};
use super::verification::{FileStore, IngestOutcome, VerificationService};
use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::messages;
use crate::middleware::auth::create_jwt;
use crate::models::{ChatKind, Message, PassportData, TelegramUser, Update, User};

/// Lifetime of tokens handed out by `/admin_token`.
const ADMIN_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case")]
pub enum Command {
    #[command(description = "Start the bot.")]
    Start,
    #[command(description = "Help center.")]
    Help,
    #[command(description = "Verify your identity.")]
    Verify,
    #[command(description = "Delete your account.")]
    DeleteAccount,
    #[command(hide)]
    AdminToken,
}

/// Processes updates received by the webhook.
pub struct BotService {
    db: FirestoreDb,
    messenger: Arc<dyn Messenger>,
    verification: VerificationService,
    backend_url: String,
    bot_username: String,
    session_ttl: Duration,
    jwt_signing_key: Vec<u8>,
}

impl BotService {
    pub fn new(
        config: &Config,
        db: FirestoreDb,
        messenger: Arc<dyn Messenger>,
        decryptor: Arc<PassportDecryptor>,
    ) -> Self {
        let verification = VerificationService::new(
            db.clone(),
            decryptor,
            FileStore::new(config.passport_files_dir.clone()),
        );
        Self {
            db,
            messenger,
            verification,
            backend_url: config.backend_url.clone(),
            bot_username: config.bot_username.clone(),
            session_ttl: config.session_ttl,
            jwt_signing_key: config.jwt_signing_key.clone(),
        }
    }

    /// Handle one update. Updates without a message are ignored.
    pub async fn process_update(&self, update: &Update) -> Result<(), AppError> {
        let Some(message) = update.message.as_ref() else {
            tracing::debug!(
                update_id = update.update_id,
                kind = update.kind(),
                "Ignoring update without message"
            );
            return Ok(());
        };

        if let Some(passport) = &message.passport_data {
            return self.handle_passport(message, passport).await;
        }

        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };

        if message.is_command() {
            self.handle_command(message, text).await
        } else {
            // Echo
            self.messenger
                .send_message(message.chat.id, text, None)
                .await
        }
    }

    async fn handle_command(&self, message: &Message, text: &str) -> Result<(), AppError> {
        let chat_id = message.chat.id;
        // Only the command word is parsed; `/start <payload>` is still /start.
        let word = text.split_whitespace().next().unwrap_or_default();

        let command = match Command::parse(word, &self.bot_username) {
            Ok(command) => command,
            Err(ParseError::WrongBotName(bot)) => {
                tracing::debug!(%bot, "Command addressed to another bot");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(error = %e, "Unrecognised command");
                return self
                    .messenger
                    .send_message(chat_id, messages::UNKNOWN_COMMAND, None)
                    .await;
            }
        };

        let Some(from) = message.from.as_ref() else {
            tracing::debug!(?command, "Command without sender");
            return Ok(());
        };

        tracing::info!(telegram_id = from.id, ?command, "Handling command");

        match command {
            Command::Start => self.start(chat_id, from).await,
            Command::Help => self.messenger.send_message(chat_id, messages::HELP, None).await,
            Command::Verify => self.verify(message, from).await,
            Command::DeleteAccount => self.delete_account(chat_id, from).await,
            Command::AdminToken => self.admin_token(message, from).await,
        }
    }

    /// Create the user if needed. Returns `None` if the user was just created
    /// (and welcomed).
    async fn find_or_register(&self, chat_id: i64, from: &TelegramUser) -> Result<Option<User>, AppError> {
        if let Some(user) = self.db.get_user(&from.id.to_string()).await? {
            return Ok(Some(user));
        }

        let user = User::from_telegram(from);
        self.db.create_user(&user).await?;
        self.messenger
            .send_message(chat_id, &messages::welcome(&user.first_name), None)
            .await?;
        Ok(None)
    }

    async fn start(&self, chat_id: i64, from: &TelegramUser) -> Result<(), AppError> {
        if let Some(user) = self.find_or_register(chat_id, from).await? {
            self.messenger
                .send_message(chat_id, &messages::welcome_back(&user.first_name), None)
                .await?;
        }
        Ok(())
    }

    async fn verify(&self, message: &Message, from: &TelegramUser) -> Result<(), AppError> {
        let chat_id = message.chat.id;
        if message.chat.kind != ChatKind::Private {
            return self
                .messenger
                .send_message(chat_id, messages::PRIVATE_CHAT_ONLY, None)
                .await;
        }

        if self.find_or_register(chat_id, from).await?.is_none() {
            return Ok(());
        }

        let token = generate_token()?;
        let keyboard = vec![vec![UrlButton {
            text: messages::VERIFY_BUTTON.to_string(),
            url: verify_url(&self.backend_url, &token),
        }]];
        self.messenger
            .send_message(chat_id, messages::VERIFY_EXPLAINER, Some(keyboard))
            .await?;

        self.db
            .create_session(&from.id.to_string(), &token, None, self.session_ttl)
            .await?;
        Ok(())
    }

    async fn delete_account(&self, chat_id: i64, from: &TelegramUser) -> Result<(), AppError> {
        match self.db.delete_user(&from.id.to_string()).await {
            Ok(_) => {
                self.messenger
                    .send_message(chat_id, messages::ACCOUNT_DELETED, None)
                    .await
            }
            Err(AppError::NotFound(_)) => {
                self.messenger
                    .send_message(chat_id, messages::NOT_REGISTERED, None)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn admin_token(&self, message: &Message, from: &TelegramUser) -> Result<(), AppError> {
        let chat_id = message.chat.id;
        let is_admin = self
            .db
            .get_user(&from.id.to_string())
            .await?
            .is_some_and(|u| u.is_admin && u.is_active);

        if !is_admin {
            tracing::warn!(telegram_id = from.id, "Non-admin requested review token");
            return self
                .messenger
                .send_message(chat_id, messages::UNKNOWN_COMMAND, None)
                .await;
        }
        if message.chat.kind != ChatKind::Private {
            return self
                .messenger
                .send_message(chat_id, messages::PRIVATE_CHAT_ONLY, None)
                .await;
        }

        let token = create_jwt(&from.id.to_string(), &self.jwt_signing_key, ADMIN_TOKEN_TTL)?;
        self.messenger
            .send_message(chat_id, &messages::admin_token(&token), None)
            .await
    }

    async fn handle_passport(&self, message: &Message, passport: &PassportData) -> Result<(), AppError> {
        let Some(from) = message.from.as_ref() else {
            tracing::warn!("Passport data without sender");
            return Ok(());
        };

        tracing::info!(
            telegram_id = from.id,
            elements = passport.data.len(),
            "Passport data received"
        );

        let outcome = match self
            .verification
            .ingest(self.messenger.as_ref(), from, passport)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(telegram_id = from.id, error = %e, "Passport ingestion failed");
                return self
                    .messenger
                    .send_message(from.id, messages::SUBMISSION_FAILED, None)
                    .await;
            }
        };

        match outcome {
            IngestOutcome::Stored(_) => {
                self.messenger
                    .send_message(from.id, &messages::documents_received(&from.first_name), None)
                    .await
            }
            IngestOutcome::UnknownSession => {
                self.messenger
                    .send_message(from.id, messages::LINK_EXPIRED, None)
                    .await
            }
            IngestOutcome::AlreadyReceived => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "bot").unwrap(), Command::Start);
        assert_eq!(
            Command::parse("/delete_account", "bot").unwrap(),
            Command::DeleteAccount
        );
        assert_eq!(Command::parse("/verify@bot", "bot").unwrap(), Command::Verify);
        assert!(Command::parse("/donate", "bot").is_err());
        assert!(matches!(
            Command::parse("/verify@other_bot", "bot"),
            Err(ParseError::WrongBotName(_))
        ));
    }

    #[test]
    fn test_admin_token_is_hidden() {
        let listed: Vec<String> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert!(listed.iter().any(|c| c.ends_with("verify")));
        assert!(!listed.iter().any(|c| c.contains("admin_token")));
    }
}
