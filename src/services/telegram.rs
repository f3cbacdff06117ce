// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telegram Bot API client.
//!
//! Outbound calls go through the [`Messenger`] trait so the bot logic can be
//! exercised without network access.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;

use super::bot::Command;
use crate::error::AppError;

/// A button that opens a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlButton {
    pub text: String,
    pub url: String,
}

/// Rows of URL buttons shown under a message.
pub type InlineKeyboard = Vec<Vec<UrlButton>>;

/// Outbound operations the bot needs from Telegram.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), AppError>;

    /// Download the raw (still encrypted, for Passport files) file contents.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, AppError>;
}

/// [`Messenger`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Point Telegram at our webhook endpoint.
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), AppError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| AppError::BadRequest(format!("Invalid webhook URL: {}", e)))?;

        let mut request = self.bot.set_webhook(url);
        if let Some(secret) = secret_token {
            request = request.secret_token(secret.to_string());
        }
        request.await?;

        tracing::info!("Telegram webhook registered");
        Ok(())
    }

    /// Publish the command list shown in Telegram clients.
    pub async fn register_commands(&self) -> Result<(), AppError> {
        self.bot.set_my_commands(Command::bot_commands()).await?;
        Ok(())
    }

    /// The bot's username, as reported by `getMe`.
    pub async fn username(&self) -> Result<String, AppError> {
        let me = self.bot.get_me().await?;
        Ok(me.username().to_string())
    }
}

fn to_markup(keyboard: InlineKeyboard) -> Result<InlineKeyboardMarkup, AppError> {
    let rows = keyboard
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|button| {
                    let url = reqwest::Url::parse(&button.url).map_err(|e| {
                        AppError::Internal(anyhow::anyhow!("Invalid button URL: {}", e))
                    })?;
                    Ok(InlineKeyboardButton::url(button.text, url))
                })
                .collect::<Result<Vec<_>, AppError>>()
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), AppError> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard)?);
        }
        request.await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, AppError> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;

        let mut buf = Vec::with_capacity(file.size as usize);
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(|e| AppError::Telegram(format!("File download failed: {}", e)))?;

        tracing::debug!(bytes = buf.len(), "Downloaded Telegram file");
        Ok(buf)
    }
}
