//! User model for storage and API.

use serde::{Deserialize, Serialize};

use super::telegram::TelegramUser;
use crate::time_utils::now_rfc3339;

/// User profile stored in Firestore, keyed by Telegram id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Telegram user id (also used as document ID)
    pub telegram_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Email address (shared through Passport, if ever)
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Build a new user record from the sender of a Telegram message.
    pub fn from_telegram(tg: &TelegramUser) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            telegram_id: tg.id.to_string(),
            first_name: tg.first_name.clone(),
            last_name: tg.last_name.clone(),
            username: tg.username.clone(),
            email: None,
            is_admin: false,
            is_active: true,
            is_verified: false,
            created_at: now.clone(),
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Profile fields that may be changed after creation.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

impl UserUpdate {
    /// Apply the set fields to `user`.
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = Some(v);
        }
        if let Some(v) = self.username {
            user.username = Some(v);
        }
        if let Some(v) = self.email {
            user.email = Some(v);
        }
        if let Some(v) = self.is_admin {
            user.is_admin = v;
        }
        if let Some(v) = self.is_active {
            user.is_active = v;
        }
        if let Some(v) = self.is_verified {
            user.is_verified = v;
        }
        user.updated_at = now_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tg_user() -> TelegramUser {
        TelegramUser {
            id: 98508773,
            is_bot: false,
            first_name: "Lucia".to_string(),
            last_name: Some("Perez".to_string()),
            username: Some("lperez".to_string()),
            language_code: Some("es".to_string()),
        }
    }

    #[test]
    fn test_from_telegram_defaults() {
        let user = User::from_telegram(&tg_user());

        assert_eq!(user.telegram_id, "98508773");
        assert!(user.is_active);
        assert!(!user.is_admin);
        assert!(!user.is_verified);
        assert!(!user.is_deleted);
        assert_eq!(user.display_name(), "Lucia Perez");
    }

    #[test]
    fn test_update_only_touches_set_fields() {
        let mut user = User::from_telegram(&tg_user());
        UserUpdate {
            email: Some("lucia@example.com".to_string()),
            is_verified: Some(true),
            ..Default::default()
        }
        .apply(&mut user);

        assert_eq!(user.email.as_deref(), Some("lucia@example.com"));
        assert!(user.is_verified);
        assert_eq!(user.first_name, "Lucia");
        assert_eq!(user.username.as_deref(), Some("lperez"));
    }
}
