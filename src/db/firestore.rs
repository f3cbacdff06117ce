// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (Telegram profiles, soft-deleted)
//! - Sessions (verification link tokens with expiry)
//! - Telegram verifications (ingested Passport data and review state)

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::memory::MemoryStore;
use super::{collections, page_offset};
use crate::error::AppError;
use crate::models::session::{Session, SessionClaim};
use crate::models::{TelegramVerification, User, UserUpdate, VerificationStatus};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory store (tests and local runs without GCP).
    ///
    /// Data lives as long as the last clone of the returned handle.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    // ─── Generic Document Helpers ─────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store.get(collection, id),
        }
    }

    async fn put_doc<T>(&self, collection: &str, id: &str, obj: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(obj)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => store.put(collection, id, obj),
        }
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store.delete(collection, id);
            }
        }
        Ok(())
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        let client = match &self.backend {
            Backend::Firestore(client) => client,
            Backend::Memory(store) => {
                for id in ids {
                    store.delete(collection, id);
                }
                return Ok(());
            }
        };

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Store a new user under its Telegram id.
    ///
    /// A soft-deleted user with the same Telegram id is replaced, so a user
    /// who deleted their account can register again.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.put_doc(collections::USERS, &user.telegram_id, user)
            .await?;
        tracing::info!(telegram_id = %user.telegram_id, "User created");
        Ok(())
    }

    /// Get a user by Telegram id. Soft-deleted users are not returned.
    pub async fn get_user(&self, telegram_id: &str) -> Result<Option<User>, AppError> {
        let user: Option<User> = self.get_doc(collections::USERS, telegram_id).await?;
        Ok(user.filter(|u| !u.is_deleted))
    }

    /// List non-deleted users, oldest first. `page` is 1-indexed.
    pub async fn get_users(&self, page: u32, limit: u32) -> Result<Vec<User>, AppError> {
        let offset = page_offset(page, limit)?;

        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::USERS)
                .filter(|q| q.for_all([q.field("is_deleted").eq(false)]))
                .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
                .limit(limit)
                .offset(offset)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => {
                let mut users: Vec<User> = store
                    .all::<User>(collections::USERS)?
                    .into_iter()
                    .filter(|u| !u.is_deleted)
                    .collect();
                users.sort_by(|a, b| {
                    a.created_at
                        .cmp(&b.created_at)
                        .then_with(|| a.telegram_id.cmp(&b.telegram_id))
                });
                Ok(users
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect())
            }
        }
    }

    /// Apply `changes` to an existing user and return the updated record.
    pub async fn update_user(
        &self,
        telegram_id: &str,
        changes: UserUpdate,
    ) -> Result<User, AppError> {
        let mut user = self
            .get_user(telegram_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", telegram_id)))?;

        changes.apply(&mut user);
        self.put_doc(collections::USERS, telegram_id, &user).await?;
        Ok(user)
    }

    /// Soft-delete a user.
    pub async fn delete_user(&self, telegram_id: &str) -> Result<User, AppError> {
        let mut user = self
            .get_user(telegram_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", telegram_id)))?;

        let now = now_rfc3339();
        user.is_deleted = true;
        user.deleted_at = Some(now.clone());
        user.updated_at = now;
        self.put_doc(collections::USERS, telegram_id, &user).await?;
        let sessions = self.delete_user_sessions(telegram_id).await?;

        tracing::info!(telegram_id, sessions, "User soft-deleted");
        Ok(user)
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Store a new verification session keyed by its token.
    pub async fn create_session(
        &self,
        telegram_id: &str,
        token: &str,
        data: Option<String>,
        ttl: std::time::Duration,
    ) -> Result<Session, AppError> {
        let session = Session::new(
            telegram_id.to_string(),
            token.to_string(),
            data,
            Utc::now(),
            ttl,
        );
        self.put_doc(collections::SESSIONS, token, &session).await?;
        tracing::debug!(telegram_id, expires_at = %session.expires_at, "Session created");
        Ok(session)
    }

    /// Look up a session by token. Deleted and expired sessions are not returned.
    pub async fn get_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        if token.is_empty() {
            return Ok(None);
        }
        let session: Option<Session> = self.get_doc(collections::SESSIONS, token).await?;
        let now = Utc::now();
        Ok(session.filter(|s| s.is_live(now)))
    }

    /// Remove a session permanently. Returns the removed session, if it was live.
    pub async fn delete_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        let session = self.get_session(token).await?;
        if session.is_some() {
            self.delete_doc(collections::SESSIONS, token).await?;
            self.delete_doc(collections::SESSION_CLAIMS, token).await?;
        }
        Ok(session)
    }

    /// Permanently delete every session of a user, live or not.
    ///
    /// Returns the number of sessions removed.
    pub async fn delete_user_sessions(&self, telegram_id: &str) -> Result<usize, AppError> {
        let sessions: Vec<Session> = match &self.backend {
            Backend::Firestore(client) => {
                let owner = telegram_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::SESSIONS)
                    .filter(move |q| q.for_all([q.field("telegram_id").eq(owner.clone())]))
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
            }
            Backend::Memory(store) => store
                .all::<Session>(collections::SESSIONS)?
                .into_iter()
                .filter(|s| s.telegram_id == telegram_id)
                .collect(),
        };

        let tokens: Vec<String> = sessions.into_iter().map(|s| s.token).collect();
        self.batch_delete(collections::SESSIONS, &tokens).await?;
        self.batch_delete(collections::SESSION_CLAIMS, &tokens).await?;
        Ok(tokens.len())
    }

    /// Take up the Passport submission of session `token`.
    ///
    /// Returns false if the session was already claimed. The check and the
    /// write are a single create-only operation, so concurrent deliveries of
    /// the same submission cannot both succeed.
    pub async fn claim_session(&self, token: &str, telegram_id: &str) -> Result<bool, AppError> {
        let claim = SessionClaim {
            token: token.to_string(),
            telegram_id: telegram_id.to_string(),
            created_at: now_rfc3339(),
        };

        match &self.backend {
            Backend::Firestore(client) => {
                let created: Result<SessionClaim, _> = client
                    .fluent()
                    .insert()
                    .into(collections::SESSION_CLAIMS)
                    .document_id(token)
                    .object(&claim)
                    .execute()
                    .await;
                match created {
                    Ok(_) => Ok(true),
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(store) => store.insert_new(collections::SESSION_CLAIMS, token, &claim),
        }
    }

    /// Give up a claim so the submission can be sent again.
    pub async fn release_session_claim(&self, token: &str) -> Result<(), AppError> {
        self.delete_doc(collections::SESSION_CLAIMS, token).await
    }

    /// Replace the free-form `data` of a live session.
    pub async fn mark_session(&self, token: &str, data: &str) -> Result<Session, AppError> {
        let mut session = self
            .get_session(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        session.data = Some(data.to_string());
        session.updated_at = now_rfc3339();
        self.put_doc(collections::SESSIONS, token, &session).await?;
        Ok(session)
    }

    /// Permanently delete every session that expired at or before `now`.
    ///
    /// Returns the number of sessions removed.
    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let cutoff = format_utc_rfc3339(now);

        let expired: Vec<Session> = match &self.backend {
            Backend::Firestore(client) => {
                let cutoff = cutoff.clone();
                client
                    .fluent()
                    .select()
                    .from(collections::SESSIONS)
                    .filter(move |q| {
                        q.for_all([q.field("expires_at").less_than_or_equal(cutoff.clone())])
                    })
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
            }
            Backend::Memory(store) => store
                .all::<Session>(collections::SESSIONS)?
                .into_iter()
                .filter(|s| s.expires_at <= cutoff)
                .collect(),
        };

        let tokens: Vec<String> = expired.into_iter().map(|s| s.token).collect();
        self.batch_delete(collections::SESSIONS, &tokens).await?;
        self.batch_delete(collections::SESSION_CLAIMS, &tokens).await?;

        Ok(tokens.len())
    }

    // ─── Verification Operations ─────────────────────────────────

    pub async fn get_verification(
        &self,
        telegram_id: &str,
    ) -> Result<Option<TelegramVerification>, AppError> {
        let verification: Option<TelegramVerification> = self
            .get_doc(collections::TELEGRAM_VERIFICATIONS, telegram_id)
            .await?;
        Ok(verification.filter(|v| !v.is_deleted))
    }

    /// Create or replace the verification record of a user.
    pub async fn upsert_verification(
        &self,
        verification: &TelegramVerification,
    ) -> Result<(), AppError> {
        self.put_doc(
            collections::TELEGRAM_VERIFICATIONS,
            &verification.telegram_id,
            verification,
        )
        .await
    }

    /// List verification records, oldest first, optionally by status.
    pub async fn list_verifications(
        &self,
        status: Option<VerificationStatus>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TelegramVerification>, AppError> {
        let offset = page_offset(page, limit)?;

        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::TELEGRAM_VERIFICATIONS)
                .filter(move |q| {
                    q.for_all([
                        q.field("is_deleted").eq(false),
                        status.and_then(|s| q.field("status").eq(s.as_str())),
                    ])
                })
                .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
                .limit(limit)
                .offset(offset)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => {
                let mut records: Vec<TelegramVerification> = store
                    .all::<TelegramVerification>(collections::TELEGRAM_VERIFICATIONS)?
                    .into_iter()
                    .filter(|v| !v.is_deleted)
                    .filter(|v| status.map_or(true, |s| v.status == s))
                    .collect();
                records.sort_by(|a, b| {
                    a.created_at
                        .cmp(&b.created_at)
                        .then_with(|| a.telegram_id.cmp(&b.telegram_id))
                });
                Ok(records
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect())
            }
        }
    }
}
