// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telegram Passport wire types: the encrypted payload attached to a
//! message and the credentials structure it decrypts to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Encrypted Passport data shared with the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportData {
    pub data: Vec<EncryptedPassportElement>,
    pub credentials: EncryptedCredentials,
}

/// Credentials needed to decrypt the elements, themselves encrypted
/// with the bot's public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedCredentials {
    /// Base64 AES-256-CBC encrypted credentials JSON
    pub data: String,
    /// Base64 SHA-256 of the decrypted credentials
    pub hash: String,
    /// Base64 RSA-OAEP encrypted secret
    pub secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    PersonalDetails,
    Passport,
    DriverLicense,
    IdentityCard,
    InternalPassport,
    Address,
    UtilityBill,
    BankStatement,
    RentalAgreement,
    PassportRegistration,
    TemporaryRegistration,
    PhoneNumber,
    Email,
}

impl ElementType {
    /// Key of this type in `SecureData`.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::PersonalDetails => "personal_details",
            ElementType::Passport => "passport",
            ElementType::DriverLicense => "driver_license",
            ElementType::IdentityCard => "identity_card",
            ElementType::InternalPassport => "internal_passport",
            ElementType::Address => "address",
            ElementType::UtilityBill => "utility_bill",
            ElementType::BankStatement => "bank_statement",
            ElementType::RentalAgreement => "rental_agreement",
            ElementType::PassportRegistration => "passport_registration",
            ElementType::TemporaryRegistration => "temporary_registration",
            ElementType::PhoneNumber => "phone_number",
            ElementType::Email => "email",
        }
    }

    /// Identity documents carry a front side, optional selfie and
    /// encrypted document data.
    pub fn is_identity_document(self) -> bool {
        matches!(
            self,
            ElementType::Passport
                | ElementType::DriverLicense
                | ElementType::IdentityCard
                | ElementType::InternalPassport
        )
    }

    /// Only two-sided identity documents have a reverse side.
    pub fn has_reverse_side(self) -> bool {
        matches!(self, ElementType::DriverLicense | ElementType::IdentityCard)
    }

    /// Proof-of-address documents are delivered as file scans only.
    pub fn is_address_document(self) -> bool {
        matches!(
            self,
            ElementType::UtilityBill
                | ElementType::BankStatement
                | ElementType::RentalAgreement
                | ElementType::PassportRegistration
                | ElementType::TemporaryRegistration
        )
    }

    /// Elements whose `data` field is an encrypted JSON object.
    pub fn has_encrypted_data(self) -> bool {
        self.is_identity_document()
            || matches!(self, ElementType::PersonalDetails | ElementType::Address)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPassportElement {
    #[serde(rename = "type")]
    pub kind: ElementType,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub files: Vec<PassportFile>,
    #[serde(default)]
    pub front_side: Option<PassportFile>,
    #[serde(default)]
    pub reverse_side: Option<PassportFile>,
    #[serde(default)]
    pub selfie: Option<PassportFile>,
    #[serde(default)]
    pub translation: Vec<PassportFile>,
    pub hash: String,
}

/// An encrypted file uploaded to Telegram Passport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportFile {
    pub file_id: String,
    #[serde(default)]
    pub file_unique_id: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_date: i64,
}

// ─── Decrypted credentials ──────────────────────────────────────

/// Decrypted credentials JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub secure_data: BTreeMap<String, SecureValue>,
    pub nonce: String,
}

impl Credentials {
    pub fn for_element(&self, kind: ElementType) -> Option<&SecureValue> {
        self.secure_data.get(kind.as_str())
    }
}

/// Secrets for one element type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecureValue {
    #[serde(default)]
    pub data: Option<DataCredentials>,
    #[serde(default)]
    pub front_side: Option<FileCredentials>,
    #[serde(default)]
    pub reverse_side: Option<FileCredentials>,
    #[serde(default)]
    pub selfie: Option<FileCredentials>,
    #[serde(default)]
    pub translation: Vec<FileCredentials>,
    #[serde(default)]
    pub files: Vec<FileCredentials>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataCredentials {
    pub data_hash: String,
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileCredentials {
    pub file_hash: String,
    pub secret: String,
}
