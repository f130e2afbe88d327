//! Encrypted and plain snapshot documents.
//!
//! The cipher itself lives outside this crate; only the envelope shape and
//! the password error conditions are handled here.

use serde::{Deserialize, Serialize};

use super::{Snapshot, SNAPSHOT_VERSION};
use crate::error::{Error, Result};

/// Symmetric, password-based cipher supplied by the caller.
pub trait SnapshotCipher: Send + Sync {
    /// Encrypt a serialized snapshot
    fn encrypt(&self, plaintext: &str, password: &str) -> Result<String>;

    /// Decrypt `ciphertext`; any error is reported as a wrong password
    fn decrypt(&self, ciphertext: &str, password: &str) -> Result<String>;
}

/// `{ version, isEncrypted: true, encryptedContent }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedSnapshot {
    #[serde(default = "super::default_version")]
    pub version: u32,
    pub is_encrypted: bool,
    pub encrypted_content: String,
}

/// A snapshot file as found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SnapshotEnvelope {
    Encrypted(EncryptedSnapshot),
    Plain(Snapshot),
}

impl SnapshotEnvelope {
    /// Classify and decode a snapshot file. Plain documents are fully
    /// validated; encrypted ones only have their wrapper checked.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|error| Error::InvalidFormat(format!("not valid JSON: {error}")))?;

        let encrypted = value
            .get("isEncrypted")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        if encrypted {
            let wrapper: EncryptedSnapshot = serde_json::from_value(value)
                .map_err(|error| Error::InvalidFormat(error.to_string()))?;
            return Ok(Self::Encrypted(wrapper));
        }

        Snapshot::from_value(value).map(Self::Plain)
    }

    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Decode a snapshot file, decrypting it when needed.
///
/// All failures happen before the store is touched.
pub fn open_snapshot(
    payload: &str,
    cipher: Option<&dyn SnapshotCipher>,
    password: Option<&str>,
) -> Result<Snapshot> {
    let wrapper = match SnapshotEnvelope::from_json_str(payload)? {
        SnapshotEnvelope::Plain(snapshot) => return Ok(snapshot),
        SnapshotEnvelope::Encrypted(wrapper) => wrapper,
    };

    let Some(password) = password.filter(|password| !password.is_empty()) else {
        return Err(Error::PasswordRequired);
    };
    let Some(cipher) = cipher else {
        return Err(Error::Config(
            "snapshot is encrypted but no cipher is configured".to_string(),
        ));
    };

    let plaintext = cipher
        .decrypt(&wrapper.encrypted_content, password)
        .map_err(|error| {
            tracing::debug!("Snapshot decryption failed: {error}");
            Error::InvalidPassword
        })?;

    let value: serde_json::Value =
        serde_json::from_str(&plaintext).map_err(|_| Error::InvalidPassword)?;
    Snapshot::from_value(value)
}

/// Serialize and encrypt a snapshot for writing to disk
pub fn seal_snapshot(
    snapshot: &Snapshot,
    cipher: &dyn SnapshotCipher,
    password: &str,
) -> Result<EncryptedSnapshot> {
    if password.is_empty() {
        return Err(Error::PasswordRequired);
    }

    let plaintext = serde_json::to_string(snapshot)?;
    Ok(EncryptedSnapshot {
        version: SNAPSHOT_VERSION,
        is_encrypted: true,
        encrypted_content: cipher.encrypt(&plaintext, password)?,
    })
}
