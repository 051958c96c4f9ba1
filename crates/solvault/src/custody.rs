//! Keypair custody: generate, import, retrieve, and delete wallets.
//!
//! Each wallet is one record at `wallet/{id}`:
//! ```json
//! { "private_key": "<base58 64-byte keypair>", "public_key": "<base58>" }
//! ```
//!
//! The public key is re-derived and compared on every load, so a record
//! whose halves disagree is reported as corrupt rather than used.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::keys::{PublicKey, WalletKeypair};
use crate::crypto::random::RandomSource;
use crate::error::{Result, VaultError};
use crate::storage::{validate_identifier, Storage, StorageEntry, WALLET_PREFIX};

/// Stored form of a keypair.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct WalletEntry {
    private_key: String,
    public_key: String,
}

impl WalletEntry {
    fn from_keypair(keypair: &WalletKeypair) -> Self {
        Self {
            private_key: keypair.private_key_base58(),
            public_key: keypair.public_key().to_base58(),
        }
    }
}

fn wallet_key(id: &str) -> String {
    format!("{WALLET_PREFIX}{id}")
}

/// Custodian of keypairs, scoped to one storage and random source.
///
/// Holds no key material between calls.
pub struct KeyCustody<'a> {
    storage: &'a dyn Storage,
    random: &'a dyn RandomSource,
}

impl<'a> KeyCustody<'a> {
    pub fn new(storage: &'a dyn Storage, random: &'a dyn RandomSource) -> Self {
        Self { storage, random }
    }

    /// Draw a fresh keypair and store it under `id`.
    ///
    /// Returns only the public key.
    pub fn generate(&self, id: &str) -> Result<PublicKey> {
        validate_identifier(id)?;
        let keypair = WalletKeypair::generate(self.random)?;
        let public_key = self.store_new(id, &keypair)?;
        log::info!("generated wallet {id} ({public_key})");
        Ok(public_key)
    }

    /// Store caller-supplied private key material under `id`.
    pub fn import(&self, id: &str, private_key_b58: &str) -> Result<PublicKey> {
        validate_identifier(id)?;
        if private_key_b58.is_empty() {
            return Err(VaultError::MissingField("private key"));
        }
        let keypair = WalletKeypair::from_base58(private_key_b58)?;
        let public_key = self.store_new(id, &keypair)?;
        log::info!("imported wallet {id} ({public_key})");
        Ok(public_key)
    }

    /// Load the keypair stored under `id`.
    pub fn get(&self, id: &str) -> Result<WalletKeypair> {
        validate_identifier(id)?;
        let key = wallet_key(id);
        let entry = self
            .storage
            .get(&key)?
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;
        let record: WalletEntry = entry.decode_json()?;

        let keypair = WalletKeypair::from_base58(&record.private_key)
            .map_err(|_| VaultError::CorruptRecord(format!("{key}: undecodable private key")))?;
        if keypair.public_key().to_base58() != record.public_key {
            log::warn!("wallet record {key} has a public key that does not match its private key");
            return Err(VaultError::CorruptRecord(format!("{key}: keypair mismatch")));
        }
        Ok(keypair)
    }

    /// Load only the public half of the keypair under `id`.
    pub fn public_key(&self, id: &str) -> Result<PublicKey> {
        Ok(*self.get(id)?.public_key())
    }

    /// Remove `id`. Removing an absent wallet is not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        validate_identifier(id)?;
        self.storage.delete(&wallet_key(id))?;
        log::info!("deleted wallet {id}");
        Ok(())
    }

    /// Identifiers of all stored wallets, in storage order.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = self.storage.list(WALLET_PREFIX)?;
        ids.retain(|name| !name.ends_with('/'));
        Ok(ids)
    }

    fn store_new(&self, id: &str, keypair: &WalletKeypair) -> Result<PublicKey> {
        let record = WalletEntry::from_keypair(keypair);
        let mut entry = StorageEntry::json(wallet_key(id), &record)?;
        let written = self.storage.put_if_absent(entry.clone());
        entry.value.zeroize();
        if !written? {
            return Err(VaultError::AlreadyExists(id.to_string()));
        }
        Ok(*keypair.public_key())
    }
}
