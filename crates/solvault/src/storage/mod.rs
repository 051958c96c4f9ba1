//! Storage collaborators.
//!
//! The core never talks to a disk or database directly. It goes through the
//! [`Storage`] key-value trait, keyed by opaque `/`-separated paths:
//!
//! ```text
//! wallet/{id}         : keypair records
//! nonce/{public_key}  : live challenges
//! config              : auth configuration singleton
//! ```
//!
//! # Modules
//!
//! - [`memory`]: in-process map, atomic conditional writes.
//! - [`file`]: one JSON file per key under a root directory.
//! - [`sealed`]: wraps any storage and encrypts values under chosen prefixes.

pub mod file;
pub mod memory;
pub mod sealed;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, VaultError};

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sealed::SealedStorage;

/// Prefix for keypair records.
pub const WALLET_PREFIX: &str = "wallet/";

/// Prefix for challenge records.
pub const NONCE_PREFIX: &str = "nonce/";

/// Slot for the auth configuration singleton.
pub const CONFIG_KEY: &str = "config";

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl StorageEntry {
    /// Build an entry holding `value` serialized as JSON.
    pub fn json<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self> {
        let value =
            serde_json::to_vec(value).map_err(|e| VaultError::SerializationError(e.to_string()))?;
        Ok(Self {
            key: key.into(),
            value,
        })
    }

    /// Decode the JSON value. A record that fails to decode is corrupt.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.value)
            .map_err(|e| VaultError::CorruptRecord(format!("{}: {e}", self.key)))
    }
}

/// Key-value storage with per-key atomic get/put/delete.
pub trait Storage: Send + Sync {
    /// Fetch the entry at `key`, if any.
    fn get(&self, key: &str) -> Result<Option<StorageEntry>>;

    /// Write `entry`, replacing any existing value.
    fn put(&self, entry: StorageEntry) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Names directly under `prefix`, relative to it. Nested children are
    /// reported once as `name/`. Order is implementation-defined.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Write `entry` only if `key` is absent; returns whether it was written.
    ///
    /// The default is a separate existence check followed by a write, so two
    /// concurrent callers can both observe "absent" and the later write wins.
    /// Implementations that can make this a single atomic step override it.
    fn put_if_absent(&self, entry: StorageEntry) -> Result<bool> {
        if self.get(&entry.key)?.is_some() {
            return Ok(false);
        }
        self.put(entry)?;
        Ok(true)
    }

    /// Remove `key` and return what it held. Of several concurrent callers
    /// taking the same key, exactly one receives the entry.
    ///
    /// The default reads then deletes, so it does not give that guarantee.
    /// Implementations that can make this a single atomic step override it.
    fn take(&self, key: &str) -> Result<Option<StorageEntry>> {
        let entry = self.get(key)?;
        if entry.is_some() {
            self.delete(key)?;
        }
        Ok(entry)
    }
}

/// Collect the immediate children of `prefix` from an iterator of full keys.
pub(crate) fn children_of<'a>(prefix: &str, keys: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for key in keys {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let child = match rest.find('/') {
            Some(idx) => rest[..=idx].to_string(),
            None => rest.to_string(),
        };
        if !out.contains(&child) {
            out.push(child);
        }
    }
    out
}

/// Longest accepted wallet identifier, in bytes. Leaves room for the file
/// backend's extension and temporary suffix within a 255-byte file name.
pub const MAX_IDENTIFIER_LEN: usize = 200;

/// Validate that a wallet identifier is non-empty, at most
/// [`MAX_IDENTIFIER_LEN`] bytes, starts and ends with a word character, and
/// contains only word characters, `-`, `.`, or `@`.
pub fn validate_identifier(id: &str) -> Result<()> {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let is_inner = |c: char| is_word(c) || matches!(c, '-' | '.' | '@');

    let mut chars = id.chars();
    let (Some(first), last) = (chars.next(), id.chars().last()) else {
        return Err(VaultError::MissingField("wallet id"));
    };
    if id.len() > MAX_IDENTIFIER_LEN {
        return Err(VaultError::InvalidIdentifier(format!(
            "{}... ({} bytes, max {MAX_IDENTIFIER_LEN})",
            id.chars().take(16).collect::<String>(),
            id.len()
        )));
    }
    let ok = is_word(first) && last.map_or(false, is_word) && id.chars().all(is_inner);
    if !ok {
        return Err(VaultError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}
