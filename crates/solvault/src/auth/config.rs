//! Auth configuration singleton.
//!
//! Stored at the fixed `config` slot. When nothing has been written, the
//! hard-coded defaults apply.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::storage::{Storage, StorageEntry, CONFIG_KEY};

/// Default token lifetime, in seconds.
pub const DEFAULT_TOKEN_TTL: u64 = 3600;

/// Default maximum token lifetime, in seconds.
pub const DEFAULT_TOKEN_MAX_TTL: u64 = 86400;

/// Policies and lifetimes bound to every successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_policies: Vec<String>,
    pub token_ttl: u64,
    pub token_max_ttl: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_policies: Vec::new(),
            token_ttl: DEFAULT_TOKEN_TTL,
            token_max_ttl: DEFAULT_TOKEN_MAX_TTL,
        }
    }
}

impl AuthConfig {
    /// Build a validated configuration.
    ///
    /// Policy names are trimmed; blanks and duplicates are dropped, first
    /// occurrence wins. A non-zero `token_max_ttl` must not be below
    /// `token_ttl`.
    pub fn new<I, P>(policies: I, token_ttl: u64, token_max_ttl: u64) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        if token_max_ttl != 0 && token_ttl > token_max_ttl {
            return Err(VaultError::InvalidConfig(format!(
                "token_ttl ({token_ttl}s) exceeds token_max_ttl ({token_max_ttl}s)"
            )));
        }
        let mut token_policies: Vec<String> = Vec::new();
        for policy in policies {
            let policy = policy.as_ref().trim();
            if !policy.is_empty() && !token_policies.iter().any(|p| p == policy) {
                token_policies.push(policy.to_string());
            }
        }
        Ok(Self {
            token_policies,
            token_ttl,
            token_max_ttl,
        })
    }

    /// Load the stored configuration, falling back to defaults.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        match storage.get(CONFIG_KEY)? {
            Some(entry) => entry.decode_json(),
            None => Ok(Self::default()),
        }
    }

    /// Persist this configuration.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        storage.put(StorageEntry::json(CONFIG_KEY, self)?)?;
        log::info!(
            "auth config updated: {} policies, ttl {}s, max ttl {}s",
            self.token_policies.len(),
            self.token_ttl,
            self.token_max_ttl
        );
        Ok(())
    }
}
