// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telegram Passport decryption.
//!
//! Handles:
//! - Credentials secret unwrapping (RSA-OAEP with SHA-1, bot private key)
//! - Credentials, element data and file decryption (AES-256-CBC, key and IV
//!   derived from SHA-512 of secret and hash)
//! - Integrity check of every decrypted payload against its SHA-256 hash

use std::path::Path;

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::error::PassportError;
use crate::models::passport::{Credentials, DataCredentials, EncryptedCredentials, FileCredentials};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Holds the bot's Passport key pair.
pub struct PassportDecryptor {
    private_key: RsaPrivateKey,
    public_key_pem: String,
}

impl PassportDecryptor {
    /// Parse a PEM private key (PKCS#1 `RSA PRIVATE KEY` or PKCS#8 `PRIVATE KEY`).
    pub fn from_pem(pem: &str) -> Result<Self, PassportError> {
        let private_key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .map_err(|e| PassportError::InvalidKey(e.to_string()))?;

        let public_key_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| PassportError::InvalidKey(e.to_string()))?;

        Ok(Self {
            private_key,
            public_key_pem,
        })
    }

    /// Load the private key from a PEM file.
    pub fn load(path: &Path) -> Result<Self, PassportError> {
        let pem = std::fs::read_to_string(path).map_err(|e| {
            PassportError::InvalidKey(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_pem(&pem)
    }

    /// Public key in SPKI PEM form, as the Passport request expects it.
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// Unwrap and decrypt the credentials attached to Passport data.
    pub fn decrypt_credentials(
        &self,
        encrypted: &EncryptedCredentials,
    ) -> Result<Credentials, PassportError> {
        let wrapped_secret = BASE64.decode(&encrypted.secret)?;
        let hash = BASE64.decode(&encrypted.hash)?;
        let data = BASE64.decode(&encrypted.data)?;

        let secret = self
            .private_key
            .decrypt(Oaep::new::<sha1::Sha1>(), &wrapped_secret)
            .map_err(|_| PassportError::Rsa)?;

        let plain = decrypt_data(&data, &secret, &hash)?;
        Ok(serde_json::from_slice(&plain)?)
    }
}

/// Decrypt one payload and verify it against `hash`.
///
/// The plaintext starts with a padding-length byte followed by that many
/// bytes of padding (the length byte included).
pub fn decrypt_data(ciphertext: &[u8], secret: &[u8], hash: &[u8]) -> Result<Vec<u8>, PassportError> {
    let digest = Sha512::new()
        .chain_update(secret)
        .chain_update(hash)
        .finalize();
    let (key, iv) = (&digest[..32], &digest[32..48]);

    let mut buf = ciphertext.to_vec();
    let plain = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| PassportError::Decrypt("invalid key or IV length".to_string()))?
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| {
            PassportError::Decrypt("ciphertext is not a whole number of blocks".to_string())
        })?;

    let computed = Sha256::digest(plain);
    if !bool::from(computed.as_slice().ct_eq(hash)) {
        return Err(PassportError::HashMismatch);
    }

    let padding = usize::from(*plain.first().ok_or(PassportError::Padding)?);
    if padding == 0 || padding > plain.len() {
        return Err(PassportError::Padding);
    }

    Ok(plain[padding..].to_vec())
}

/// Decrypt the base64 `data` field of an element into JSON.
pub fn decrypt_element_data(
    data_b64: &str,
    credentials: &DataCredentials,
) -> Result<serde_json::Value, PassportError> {
    let data = BASE64.decode(data_b64)?;
    let secret = BASE64.decode(&credentials.secret)?;
    let hash = BASE64.decode(&credentials.data_hash)?;

    let plain = decrypt_data(&data, &secret, &hash)?;
    Ok(serde_json::from_slice(&plain)?)
}

/// Decrypt a downloaded Passport file.
pub fn decrypt_file(
    encrypted: &[u8],
    credentials: &FileCredentials,
) -> Result<Vec<u8>, PassportError> {
    let secret = BASE64.decode(&credentials.secret)?;
    let hash = BASE64.decode(&credentials.file_hash)?;
    decrypt_data(encrypted, &secret, &hash)
}
