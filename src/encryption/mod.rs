//! Document protection hook.
//!
//! The core does not implement a security handler. It derives the permanent
//! file identifier and exposes [`EncryptionProvider`], a narrow interface that a
//! caller-supplied handler implements. The write pipeline hands every string
//! and stream payload of an encryptable object to [`EncryptionProvider::encrypt`].
//!
//! Requesting protection (setting a password) without installing a provider
//! fails at document construction; protection is never silently skipped.

use crate::config::DocumentInfo;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Password options requesting document protection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityOptions {
    /// Password required to open the document
    pub user_password: Option<String>,
    /// Password granting full permissions
    pub owner_password: Option<String>,
}

impl SecurityOptions {
    /// Whether either password is set (and non-empty).
    pub fn requests_encryption(&self) -> bool {
        let set = |p: &Option<String>| p.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.user_password) || set(&self.owner_password)
    }
}

/// Pluggable encryption handler.
///
/// Implementations own key derivation; the core only calls these methods.
pub trait EncryptionProvider {
    /// Encrypt a string or stream payload belonging to object `object_id`.
    fn encrypt(&self, data: &[u8], object_id: u32, generation: u16) -> Vec<u8>;

    /// Entries of the `/Encrypt` dictionary written to the document.
    ///
    /// `file_id` is the permanent identifier placed in the trailer.
    fn encrypt_dictionary(&self, file_id: &[u8], options: &SecurityOptions) -> Dictionary;
}

/// Resolve the protection requested by `options`.
///
/// Returns `Ok(None)` when neither password is set. When a password is set the
/// installed provider is returned, or [`Error::EncryptionUnavailable`] if there
/// is none.
pub fn create(
    options: &SecurityOptions,
    provider: Option<Box<dyn EncryptionProvider>>,
) -> Result<Option<Box<dyn EncryptionProvider>>> {
    if !options.requests_encryption() {
        if provider.is_some() {
            log::warn!("Encryption provider installed but no password set; output is not encrypted");
        }
        return Ok(None);
    }
    match provider {
        Some(provider) => Ok(Some(provider)),
        None => Err(Error::EncryptionUnavailable),
    }
}

/// Derive the permanent file identifier from the info dictionary.
///
/// The digest input starts with the creation timestamp in milliseconds,
/// followed by one `"<Key>: <value>"` line per entry in dictionary order
/// (dates again as milliseconds). The result is the lowercase hex MD5 digest
/// as ASCII bytes.
pub fn generate_file_id(info: &DocumentInfo) -> Vec<u8> {
    let mut canonical = format!("{}\n", info.creation_date.timestamp_millis());
    for (key, value) in info.entries() {
        let rendered = match value {
            Object::Date(date) => date.timestamp_millis().to_string(),
            Object::Text(text) => text,
            other => format!("{:?}", other),
        };
        canonical.push_str(&format!("{}: {}\n", key, rendered));
    }

    let digest = Md5::digest(canonical.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex.into_bytes()
}
