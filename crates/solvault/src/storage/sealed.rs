//! Seal-wrapping storage decorator.
//!
//! Values whose key falls under a sealed prefix are encrypted before they
//! reach the inner store and decrypted on the way out. Everything else
//! passes through untouched. Keys themselves are never encrypted, so
//! listing still works. Each ciphertext is bound to its storage key as
//! associated data: a sealed value copied under another key fails to open.
//!
//! Sealed value format (JSON):
//! ```json
//! { "version": 1, "nonce": "<base64-12-bytes>", "ciphertext": "<base64>" }
//! ```

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{Storage, StorageEntry, CONFIG_KEY, WALLET_PREFIX};
use crate::crypto::random::RandomSource;
use crate::crypto::seal::SealKey;
use crate::error::{Result, VaultError};

const SEALED_VERSION: u32 = 1;

/// On-store wrapper for a sealed value.
#[derive(Debug, Serialize, Deserialize)]
struct SealedValue {
    version: u32,
    nonce: String,
    ciphertext: String,
}

/// Storage decorator that encrypts selected prefixes at rest.
pub struct SealedStorage<S> {
    inner: S,
    key: SealKey,
    random: Arc<dyn RandomSource>,
    prefixes: Vec<String>,
}

impl<S: Storage> SealedStorage<S> {
    /// Seal wallet records and the auth configuration.
    pub fn new(inner: S, key: SealKey, random: Arc<dyn RandomSource>) -> Self {
        Self::with_prefixes(inner, key, random, [WALLET_PREFIX, CONFIG_KEY])
    }

    /// Seal an explicit set of key prefixes.
    pub fn with_prefixes<I, P>(inner: S, key: SealKey, random: Arc<dyn RandomSource>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            inner,
            key,
            random,
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn is_sealed(&self, key: &str) -> bool {
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    fn seal_entry(&self, entry: StorageEntry) -> Result<StorageEntry> {
        if !self.is_sealed(&entry.key) {
            return Ok(entry);
        }
        let (nonce, ciphertext) = self.key.seal(self.random.as_ref(), &entry.value, &entry.key)?;
        let wrapped = SealedValue {
            version: SEALED_VERSION,
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
        };
        StorageEntry::json(entry.key, &wrapped)
    }

    fn open_entry(&self, entry: StorageEntry) -> Result<StorageEntry> {
        if !self.is_sealed(&entry.key) {
            return Ok(entry);
        }
        let wrapped: SealedValue = entry.decode_json()?;
        if wrapped.version != SEALED_VERSION {
            return Err(VaultError::CorruptRecord(format!(
                "{}: unsupported sealed version {}",
                entry.key, wrapped.version
            )));
        }
        let nonce: [u8; 12] = STANDARD
            .decode(&wrapped.nonce)
            .ok()
            .and_then(|n| n.try_into().ok())
            .ok_or_else(|| VaultError::CorruptRecord(format!("{}: bad seal nonce", entry.key)))?;
        let ciphertext = STANDARD
            .decode(&wrapped.ciphertext)
            .map_err(|e| VaultError::CorruptRecord(format!("{}: {e}", entry.key)))?;
        let value = self.key.open(&nonce, &ciphertext, &entry.key)?;
        Ok(StorageEntry {
            key: entry.key,
            value,
        })
    }
}

impl<S: Storage> Storage for SealedStorage<S> {
    fn get(&self, key: &str) -> Result<Option<StorageEntry>> {
        self.inner
            .get(key)?
            .map(|entry| self.open_entry(entry))
            .transpose()
    }

    fn put(&self, entry: StorageEntry) -> Result<()> {
        let sealed = self.seal_entry(entry)?;
        self.inner.put(sealed)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }

    fn put_if_absent(&self, entry: StorageEntry) -> Result<bool> {
        let sealed = self.seal_entry(entry)?;
        self.inner.put_if_absent(sealed)
    }

    fn take(&self, key: &str) -> Result<Option<StorageEntry>> {
        self.inner
            .take(key)?
            .map(|entry| self.open_entry(entry))
            .transpose()
    }
}
