// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Passport ingestion: turns decrypted Passport elements into a stored
//! verification record.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::passport::{decrypt_element_data, decrypt_file, PassportDecryptor};
use super::telegram::Messenger;
use crate::db::FirestoreDb;
use crate::error::{AppError, PassportError};
use crate::models::passport::{FileCredentials, PassportFile, SecureValue};
use crate::models::session::PASSPORT_RECEIVED;
use crate::models::{
    Credentials, ElementType, EncryptedPassportElement, PassportData, TelegramUser,
    TelegramVerification, UserUpdate,
};

/// Result of handling one Passport submission.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Data stored; the record is back in the review queue.
    Stored(TelegramVerification),
    /// The nonce does not match a live session owned by the sender.
    UnknownSession,
    /// Passport data for this session was already taken up.
    AlreadyReceived,
}

/// Writes decrypted document scans to disk, one directory per user and
/// submission.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Start collecting the files of a new submission by `telegram_id`.
    pub fn batch(&self, telegram_id: &str) -> FileBatch {
        FileBatch {
            dir: self
                .root
                .join(telegram_id)
                .join(uuid::Uuid::new_v4().to_string()),
            pending: Vec::new(),
        }
    }
}

/// Decrypted files of one submission, held in memory until committed to
/// `<root>/<telegram_id>/<submission>/`.
pub struct FileBatch {
    dir: PathBuf,
    pending: Vec<(PathBuf, Vec<u8>)>,
}

impl FileBatch {
    /// Queue `bytes` as `name`. Returns the path the file has once committed.
    pub fn add(&mut self, name: &str, bytes: Vec<u8>) -> String {
        let path = self.dir.join(name);
        let stored = path.to_string_lossy().into_owned();
        self.pending.push((path, bytes));
        stored
    }

    /// Write every queued file. On failure nothing of the batch is left on disk.
    pub async fn commit(&self) -> Result<(), AppError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.write_all().await {
            self.discard().await;
            return Err(e);
        }
        tracing::debug!(files = self.pending.len(), "Passport files written");
        Ok(())
    }

    async fn write_all(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create {:?}: {}", self.dir, e))
        })?;

        for (path, bytes) in &self.pending {
            tokio::fs::write(path, bytes).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to write {:?}: {}", path, e))
            })?;
        }
        Ok(())
    }

    /// Remove whatever this batch wrote.
    pub async fn discard(&self) {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => tracing::debug!(dir = ?self.dir, "Passport files discarded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(dir = ?self.dir, error = %e, "Failed to remove Passport files")
            }
        }
    }
}

/// Files of one element, as queued.
#[derive(Default)]
struct StoredFiles {
    front_side: Option<String>,
    reverse_side: Option<String>,
    selfie: Option<String>,
    files: Vec<String>,
    translation: Vec<String>,
}

/// Ingests Passport submissions.
#[derive(Clone)]
pub struct VerificationService {
    db: FirestoreDb,
    decryptor: Arc<PassportDecryptor>,
    files: FileStore,
}

impl VerificationService {
    pub fn new(db: FirestoreDb, decryptor: Arc<PassportDecryptor>, files: FileStore) -> Self {
        Self {
            db,
            decryptor,
            files,
        }
    }

    /// Decrypt `passport` sent by `sender` and merge it into their
    /// verification record.
    ///
    /// Nothing is persisted unless the credentials nonce names a live session
    /// belonging to the sender that has not already received Passport data.
    /// The session is claimed before any work, so a redelivered submission is
    /// ingested once. If ingestion fails the claim is released and no files
    /// are kept.
    pub async fn ingest(
        &self,
        messenger: &dyn Messenger,
        sender: &TelegramUser,
        passport: &PassportData,
    ) -> Result<IngestOutcome, AppError> {
        let credentials = self.decryptor.decrypt_credentials(&passport.credentials)?;
        let telegram_id = sender.id.to_string();

        let session = match self.db.get_session(&credentials.nonce).await? {
            Some(session) => session,
            None => {
                tracing::info!(telegram_id = %telegram_id, "Passport data for unknown or expired session");
                return Ok(IngestOutcome::UnknownSession);
            }
        };
        if session.telegram_id != telegram_id {
            tracing::warn!(
                telegram_id = %telegram_id,
                session_owner = %session.telegram_id,
                "Passport data sent for another user's session"
            );
            return Ok(IngestOutcome::UnknownSession);
        }
        let claimed = !session.passport_received()
            && self.db.claim_session(&session.token, &telegram_id).await?;
        if !claimed {
            tracing::info!(telegram_id = %telegram_id, "Passport data already received for session");
            return Ok(IngestOutcome::AlreadyReceived);
        }

        let stored = self
            .store(messenger, &telegram_id, &credentials, passport)
            .await;
        let verification = match stored {
            Ok(verification) => verification,
            Err(e) => {
                if let Err(release) = self.db.release_session_claim(&session.token).await {
                    tracing::error!(
                        telegram_id = %telegram_id,
                        error = %release,
                        "Failed to release session claim"
                    );
                }
                return Err(e);
            }
        };

        if let Err(e) = self.db.mark_session(&session.token, PASSPORT_RECEIVED).await {
            tracing::warn!(telegram_id = %telegram_id, error = %e, "Failed to mark session");
        }

        tracing::info!(
            telegram_id = %telegram_id,
            elements = passport.data.len(),
            "Passport data stored"
        );
        Ok(IngestOutcome::Stored(verification))
    }

    /// Decrypt every element, then write the files and the record.
    async fn store(
        &self,
        messenger: &dyn Messenger,
        telegram_id: &str,
        credentials: &Credentials,
        passport: &PassportData,
    ) -> Result<TelegramVerification, AppError> {
        let mut verification = self
            .db
            .get_verification(telegram_id)
            .await?
            .unwrap_or_else(|| TelegramVerification::new(telegram_id.to_string()));
        let mut email = None;
        let mut files = self.files.batch(telegram_id);

        for element in &passport.data {
            let secrets = credentials.for_element(element.kind);
            match element.kind {
                ElementType::PhoneNumber => {
                    verification.phone_number = element.phone_number.clone();
                }
                ElementType::Email => {
                    email = element.email.clone();
                }
                kind => {
                    let secrets = secrets.ok_or_else(|| {
                        PassportError::MissingCredentials(kind.as_str().to_string())
                    })?;
                    self.apply_document(messenger, element, secrets, &mut files, &mut verification)
                        .await?;
                }
            }
        }

        verification.reset_review();
        files.commit().await?;
        if let Err(e) = self.db.upsert_verification(&verification).await {
            files.discard().await;
            return Err(e);
        }

        if let Some(email) = email {
            let changes = UserUpdate {
                email: Some(email),
                ..Default::default()
            };
            match self.db.update_user(telegram_id, changes).await {
                Ok(_) | Err(AppError::NotFound(_)) => {}
                Err(e) => tracing::warn!(telegram_id, error = %e, "Failed to store Passport email"),
            }
        }

        Ok(verification)
    }

    async fn apply_document(
        &self,
        messenger: &dyn Messenger,
        element: &EncryptedPassportElement,
        secrets: &SecureValue,
        files: &mut FileBatch,
        verification: &mut TelegramVerification,
    ) -> Result<(), AppError> {
        let kind = element.kind;

        let data = if kind.has_encrypted_data() {
            match (&element.data, &secrets.data) {
                (Some(data), Some(creds)) => Some(decrypt_element_data(data, creds)?),
                (Some(_), None) => {
                    return Err(PassportError::MissingCredentials(kind.as_str().to_string()).into())
                }
                (None, _) => None,
            }
        } else {
            None
        };

        let stored = self
            .fetch_files(messenger, element, secrets, files)
            .await?;

        tracing::debug!(
            element = kind.as_str(),
            files = stored.files.len(),
            translations = stored.translation.len(),
            "Passport element decrypted"
        );

        if kind.is_identity_document() {
            if stored.front_side.is_some() {
                verification.identity_front_side = stored.front_side;
            }
            if stored.reverse_side.is_some() {
                verification.identity_reverse_side = stored.reverse_side;
            }
            if stored.selfie.is_some() {
                verification.selfie = stored.selfie;
            }
            let value = json!({
                "data": data.unwrap_or(Value::Null),
                "translation": stored.translation,
            });
            match kind {
                ElementType::DriverLicense => verification.driver_license = Some(value),
                ElementType::IdentityCard => verification.identity_card = Some(value),
                _ => verification.passport_data = Some(value),
            }
            return Ok(());
        }

        match kind {
            ElementType::PersonalDetails => verification.personal_details = data,
            ElementType::Address => verification.address = data,
            ElementType::UtilityBill | ElementType::BankStatement => {
                let value = json!({ "files": stored.files, "translation": stored.translation });
                if kind == ElementType::UtilityBill {
                    verification.utility_bill = Some(value);
                } else {
                    verification.bank_statement = Some(value);
                }
            }
            _ => {
                let mut documents = match verification.address_documents.take() {
                    Some(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                documents.insert(
                    kind.as_str().to_string(),
                    json!({ "files": stored.files, "translation": stored.translation }),
                );
                verification.address_documents = Some(Value::Object(documents));
            }
        }
        Ok(())
    }

    async fn fetch_files(
        &self,
        messenger: &dyn Messenger,
        element: &EncryptedPassportElement,
        secrets: &SecureValue,
        batch: &mut FileBatch,
    ) -> Result<StoredFiles, AppError> {
        let kind = element.kind;
        let mut stored = StoredFiles::default();

        if kind.is_identity_document() {
            stored.front_side = self
                .fetch_optional(
                    messenger,
                    batch,
                    kind,
                    "front_side",
                    &element.front_side,
                    &secrets.front_side,
                )
                .await?;
            if kind.has_reverse_side() {
                stored.reverse_side = self
                    .fetch_optional(
                        messenger,
                        batch,
                        kind,
                        "reverse_side",
                        &element.reverse_side,
                        &secrets.reverse_side,
                    )
                    .await?;
            }
            stored.selfie = self
                .fetch_optional(
                    messenger,
                    batch,
                    kind,
                    "selfie",
                    &element.selfie,
                    &secrets.selfie,
                )
                .await?;
        }

        if kind.is_address_document() {
            stored.files = self
                .fetch_all(
                    messenger,
                    batch,
                    kind,
                    "file",
                    &element.files,
                    &secrets.files,
                )
                .await?;
        }

        if kind.is_identity_document() || kind.is_address_document() {
            stored.translation = self
                .fetch_all(
                    messenger,
                    batch,
                    kind,
                    "translation",
                    &element.translation,
                    &secrets.translation,
                )
                .await?;
        }

        Ok(stored)
    }

    async fn fetch_optional(
        &self,
        messenger: &dyn Messenger,
        batch: &mut FileBatch,
        kind: ElementType,
        role: &str,
        file: &Option<PassportFile>,
        creds: &Option<FileCredentials>,
    ) -> Result<Option<String>, AppError> {
        let Some(file) = file else {
            return Ok(None);
        };
        let creds = creds.as_ref().ok_or_else(|| {
            PassportError::MissingCredentials(format!("{}.{}", kind.as_str(), role))
        })?;

        let name = format!("{}_{}.jpg", kind.as_str(), role);
        self.fetch(messenger, batch, &name, file, creds)
            .await
            .map(Some)
    }

    async fn fetch_all(
        &self,
        messenger: &dyn Messenger,
        batch: &mut FileBatch,
        kind: ElementType,
        role: &str,
        files: &[PassportFile],
        creds: &[FileCredentials],
    ) -> Result<Vec<String>, AppError> {
        if files.len() != creds.len() {
            return Err(PassportError::MissingCredentials(format!(
                "{}.{}: {} files, {} credentials",
                kind.as_str(),
                role,
                files.len(),
                creds.len()
            ))
            .into());
        }

        let mut paths = Vec::with_capacity(files.len());
        for (idx, (file, creds)) in files.iter().zip(creds).enumerate() {
            let name = format!("{}_{}_{}.jpg", kind.as_str(), role, idx);
            paths.push(self.fetch(messenger, batch, &name, file, creds).await?);
        }
        Ok(paths)
    }

    async fn fetch(
        &self,
        messenger: &dyn Messenger,
        batch: &mut FileBatch,
        name: &str,
        file: &PassportFile,
        creds: &FileCredentials,
    ) -> Result<String, AppError> {
        let encrypted = messenger.download_file(&file.file_id).await?;
        let plain = decrypt_file(&encrypted, creds)?;
        Ok(batch.add(name, plain))
    }
}
