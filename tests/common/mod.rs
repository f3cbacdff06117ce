// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use aes::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::LineEnding;
use rsa::{Oaep, RsaPrivateKey};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256, Sha512};
use std::sync::{Arc, Mutex, OnceLock};
use tower::ServiceExt;
use werise_verifier::config::Config;
use werise_verifier::db::FirestoreDb;
use werise_verifier::error::AppError;
use werise_verifier::models::{TelegramUser, User};
use werise_verifier::routes::create_router;
use werise_verifier::services::{InlineKeyboard, Messenger, PassportDecryptor};
use werise_verifier::AppState;

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ─── Recording Messenger ─────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

/// Messenger that records outgoing messages and serves files from memory.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<SentMessage> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn add_file(&self, file_id: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().push((file_id.to_string(), bytes));
    }

    /// Make downloads of `file_id` fail.
    pub fn remove_file(&self, file_id: &str) {
        self.files.lock().unwrap().retain(|(id, _)| id != file_id);
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, AppError> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == file_id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| AppError::Telegram(format!("file {} not found", file_id)))
    }
}

// ─── Test App ────────────────────────────────────────────────

/// RSA key shared by all tests in a binary (key generation is slow).
pub fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("Failed to generate RSA key")
    })
}

pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub messenger: Arc<RecordingMessenger>,
    pub files_dir: tempfile::TempDir,
}

/// Create a test app with offline dependencies (no GCP, no Telegram).
pub fn create_test_app() -> TestApp {
    let files_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::test_default();
    config.passport_files_dir = files_dir.path().to_path_buf();

    let pem = test_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("Failed to encode key");
    let passport = Arc::new(PassportDecryptor::from_pem(&pem).expect("Failed to load key"));

    let messenger = Arc::new(RecordingMessenger::default());
    let state = Arc::new(AppState::new(
        config,
        FirestoreDb::new_in_memory(),
        messenger.clone(),
        passport,
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        messenger,
        files_dir,
    }
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, headers, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Bytes) {
        let (status, _, body) = self
            .request(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        (status, body)
    }

    /// Deliver an update the way Telegram does, with the configured secret.
    pub async fn post_update(&self, update: &Value) -> (StatusCode, Value) {
        let secret = self.state.config.webhook_secret_token.clone().unwrap();
        let (status, _, body) = self
            .request(
                Request::builder()
                    .method("POST")
                    .uri(&self.state.config.webhook_path)
                    .header("Content-Type", "application/json")
                    .header("X-Telegram-Bot-Api-Secret-Token", secret)
                    .body(Body::from(update.to_string()))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    /// Names of all regular files under the Passport files directory.
    pub fn stored_files(&self) -> Vec<String> {
        fn walk(dir: &std::path::Path, out: &mut Vec<String>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }

        let mut files = Vec::new();
        walk(self.files_dir.path(), &mut files);
        files.sort();
        files
    }

    /// Store a user directly.
    pub async fn seed_user(&self, telegram_id: i64, first_name: &str, is_admin: bool) -> User {
        let mut user = User::from_telegram(&tg_user(telegram_id, first_name));
        user.is_admin = is_admin;
        self.state.db.create_user(&user).await.unwrap();
        user
    }
}

// ─── Update Fixtures ─────────────────────────────────────────

pub fn tg_user(id: i64, first_name: &str) -> TelegramUser {
    TelegramUser {
        id,
        is_bot: false,
        first_name: first_name.to_string(),
        last_name: None,
        username: None,
        language_code: None,
    }
}

fn sender(from_id: i64, first_name: &str) -> Value {
    json!({"id": from_id, "is_bot": false, "first_name": first_name})
}

/// A text message update. Texts starting with '/' get a command entity.
pub fn message_update(from_id: i64, chat_type: &str, text: &str) -> Value {
    let chat_id = if chat_type == "private" { from_id } else { -1001 };
    let entities = if text.starts_with('/') {
        let len = text.split_whitespace().next().map_or(0, |w| w.len());
        json!([{"type": "bot_command", "offset": 0, "length": len}])
    } else {
        json!([])
    };
    json!({
        "update_id": 1000 + from_id,
        "message": {
            "message_id": 1,
            "date": 1706100000,
            "chat": {"id": chat_id, "type": chat_type},
            "from": sender(from_id, "Ana"),
            "text": text,
            "entities": entities
        }
    })
}

pub fn passport_update(from_id: i64, passport: Value) -> Value {
    json!({
        "update_id": 2000 + from_id,
        "message": {
            "message_id": 2,
            "date": 1706100000,
            "chat": {"id": from_id, "type": "private"},
            "from": sender(from_id, "Ana"),
            "passport_data": passport
        }
    })
}

// ─── Passport Encryption ─────────────────────────────────────

/// Encrypt `payload` the way Telegram does. Returns (ciphertext, hash).
pub fn encrypt(payload: &[u8], secret: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let pad = 32 + (16 - (payload.len() + 32) % 16) % 16;
    let mut padded: Vec<u8> = (0..pad).map(|_| rand::random::<u8>()).collect();
    padded[0] = pad as u8;
    padded.extend_from_slice(payload);

    let hash = Sha256::digest(&padded).to_vec();
    let digest = Sha512::new()
        .chain_update(secret)
        .chain_update(&hash)
        .finalize();

    let len = padded.len();
    let ciphertext = cbc::Encryptor::<aes::Aes256>::new_from_slices(&digest[..32], &digest[32..48])
        .unwrap()
        .encrypt_padded_mut::<NoPadding>(&mut padded, len)
        .unwrap()
        .to_vec();
    (ciphertext, hash)
}

fn b64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Builds an encrypted `passport_data` payload. Encrypted files are
/// registered with the messenger so downloads succeed.
pub struct PassportBuilder<'a> {
    messenger: &'a RecordingMessenger,
    elements: Vec<Value>,
    secure_data: Map<String, Value>,
    files: usize,
}

impl<'a> PassportBuilder<'a> {
    pub fn new(messenger: &'a RecordingMessenger) -> Self {
        Self {
            messenger,
            elements: Vec::new(),
            secure_data: Map::new(),
            files: 0,
        }
    }

    fn file(&mut self, content: &[u8]) -> (Value, Value) {
        self.files += 1;
        let secret: [u8; 32] = rand::random();
        let (ciphertext, hash) = encrypt(content, &secret);
        let file_id = format!("file-{}", self.files);
        let size = ciphertext.len();
        self.messenger.add_file(&file_id, ciphertext);

        (
            json!({
                "file_id": file_id,
                "file_unique_id": format!("unique-{}", self.files),
                "file_size": size,
                "file_date": 1706100000
            }),
            json!({"file_hash": b64(&hash), "secret": b64(&secret)}),
        )
    }

    fn files(&mut self, contents: &[&[u8]]) -> (Vec<Value>, Vec<Value>) {
        contents.iter().map(|c| self.file(c)).unzip()
    }

    fn encrypted_data(data: &Value) -> (String, Value) {
        let secret: [u8; 32] = rand::random();
        let (ciphertext, hash) = encrypt(data.to_string().as_bytes(), &secret);
        (
            b64(&ciphertext),
            json!({"data_hash": b64(&hash), "secret": b64(&secret)}),
        )
    }

    pub fn phone_number(mut self, phone: &str) -> Self {
        self.elements.push(json!({
            "type": "phone_number",
            "phone_number": phone,
            "hash": b64(b"phone-hash")
        }));
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.elements.push(json!({
            "type": "email",
            "email": email,
            "hash": b64(b"email-hash")
        }));
        self
    }

    /// `personal_details` or `address`.
    pub fn data(mut self, kind: &str, data: Value) -> Self {
        let (encrypted, creds) = Self::encrypted_data(&data);
        self.elements.push(json!({
            "type": kind,
            "data": encrypted,
            "hash": b64(b"element-hash")
        }));
        self.secure_data
            .insert(kind.to_string(), json!({ "data": creds }));
        self
    }

    pub fn identity_document(
        mut self,
        kind: &str,
        data: Value,
        front: &[u8],
        reverse: Option<&[u8]>,
        selfie: Option<&[u8]>,
        translation: &[&[u8]],
    ) -> Self {
        let (encrypted, data_creds) = Self::encrypted_data(&data);
        let (front_file, front_creds) = self.file(front);
        let mut element = json!({
            "type": kind,
            "data": encrypted,
            "front_side": front_file,
            "hash": b64(b"element-hash")
        });
        let mut creds = json!({"data": data_creds, "front_side": front_creds});

        if let Some(reverse) = reverse {
            let (file, file_creds) = self.file(reverse);
            element["reverse_side"] = file;
            creds["reverse_side"] = file_creds;
        }
        if let Some(selfie) = selfie {
            let (file, file_creds) = self.file(selfie);
            element["selfie"] = file;
            creds["selfie"] = file_creds;
        }
        if !translation.is_empty() {
            let (files, file_creds) = self.files(translation);
            element["translation"] = Value::Array(files);
            creds["translation"] = Value::Array(file_creds);
        }

        self.elements.push(element);
        self.secure_data.insert(kind.to_string(), creds);
        self
    }

    pub fn address_document(mut self, kind: &str, scans: &[&[u8]], translation: &[&[u8]]) -> Self {
        let (files, file_creds) = self.files(scans);
        let (translated, translated_creds) = self.files(translation);
        self.elements.push(json!({
            "type": kind,
            "files": files,
            "translation": translated,
            "hash": b64(b"element-hash")
        }));
        self.secure_data.insert(
            kind.to_string(),
            json!({"files": file_creds, "translation": translated_creds}),
        );
        self
    }

    /// Encrypt the credentials for the bot key with `nonce`.
    pub fn build(self, nonce: &str) -> Value {
        let credentials = json!({"secure_data": self.secure_data, "nonce": nonce});
        let secret: [u8; 32] = rand::random();
        let (ciphertext, hash) = encrypt(credentials.to_string().as_bytes(), &secret);
        let wrapped = test_key()
            .to_public_key()
            .encrypt(&mut rand::thread_rng(), Oaep::new::<sha1::Sha1>(), &secret)
            .unwrap();

        json!({
            "data": self.elements,
            "credentials": {
                "data": b64(&ciphertext),
                "hash": b64(&hash),
                "secret": b64(&wrapped)
            }
        })
    }
}
