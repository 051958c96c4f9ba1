//! Challenge registry: single-use, time-bounded nonces per public key.
//!
//! States per key: absent → live → (consumed | expired) → absent.
//! Issuing again while live replaces the earlier challenge. Expiry is
//! checked lazily on consume; nothing sweeps stale records.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::crypto::keys::PublicKey;
use crate::crypto::random::{random_32, RandomSource};
use crate::error::Result;
use crate::storage::{Storage, StorageEntry, NONCE_PREFIX};
use crate::time::Clock;

/// Domain tag prepended to every nonce value.
pub const NONCE_DOMAIN: &str = "vault:solana";

/// How long a challenge stays live, in seconds.
pub const CHALLENGE_TTL_SECS: i64 = 300;

/// A stored challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Absolute expiry, Unix seconds.
    pub expires_at: i64,
    /// `vault:solana:<base64 of 32 random bytes>`.
    pub nonce: String,
    /// Base-58 public key the challenge was issued to.
    pub public_key: String,
}

/// Result of presenting a nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Nonce matched a live challenge, which is now deleted.
    Ok(Challenge),
    /// The challenge had expired and has been deleted.
    Expired,
    /// A live challenge exists but the nonce differs; it is kept.
    Mismatch,
    /// No challenge is stored for this key.
    NotFound,
}

fn nonce_key(public_key: &PublicKey) -> String {
    format!("{NONCE_PREFIX}{}", public_key.to_base58())
}

/// Issues and consumes challenges against a storage collaborator.
pub struct ChallengeRegistry<'a> {
    storage: &'a dyn Storage,
    random: &'a dyn RandomSource,
    clock: &'a dyn Clock,
}

impl<'a> ChallengeRegistry<'a> {
    pub fn new(storage: &'a dyn Storage, random: &'a dyn RandomSource, clock: &'a dyn Clock) -> Self {
        Self {
            storage,
            random,
            clock,
        }
    }

    /// Mint a fresh challenge for `public_key`, replacing any live one.
    pub fn issue(&self, public_key: &PublicKey) -> Result<Challenge> {
        let bytes = random_32(self.random)?;
        let challenge = Challenge {
            expires_at: self.clock.now() + CHALLENGE_TTL_SECS,
            nonce: format!("{NONCE_DOMAIN}:{}", STANDARD.encode(bytes)),
            public_key: public_key.to_base58(),
        };
        self.storage
            .put(StorageEntry::json(nonce_key(public_key), &challenge)?)?;
        log::debug!(
            "issued challenge for {public_key}, expires at {}",
            challenge.expires_at
        );
        Ok(challenge)
    }

    /// Read the live challenge for `public_key` without consuming it.
    pub fn peek(&self, public_key: &PublicKey) -> Result<Option<Challenge>> {
        self.storage
            .get(&nonce_key(public_key))?
            .map(|entry| entry.decode_json())
            .transpose()
    }

    /// Present `nonce` for `public_key`.
    ///
    /// Only the caller whose [`Storage::take`] removes the matching record
    /// gets [`ConsumeOutcome::Ok`]; a concurrent caller presenting the same
    /// nonce sees [`ConsumeOutcome::NotFound`].
    pub fn consume(&self, public_key: &PublicKey, nonce: &str) -> Result<ConsumeOutcome> {
        let Some(challenge) = self.peek(public_key)? else {
            return Ok(ConsumeOutcome::NotFound);
        };

        if self.clock.now() > challenge.expires_at {
            self.take_if_same(public_key, &challenge)?;
            log::debug!("challenge for {public_key} expired");
            return Ok(ConsumeOutcome::Expired);
        }

        if challenge.nonce != nonce || challenge.public_key != public_key.to_base58() {
            return Ok(ConsumeOutcome::Mismatch);
        }

        match self.take_if_same(public_key, &challenge)? {
            Taken::Ours => {
                log::debug!("consumed challenge for {public_key}");
                Ok(ConsumeOutcome::Ok(challenge))
            }
            Taken::Gone => {
                log::debug!("challenge for {public_key} was consumed concurrently");
                Ok(ConsumeOutcome::NotFound)
            }
            Taken::Replaced => Ok(ConsumeOutcome::Mismatch),
        }
    }

    /// Remove the stored challenge if it is still `seen`. A challenge issued
    /// in the meantime is put back untouched.
    fn take_if_same(&self, public_key: &PublicKey, seen: &Challenge) -> Result<Taken> {
        let Some(entry) = self.storage.take(&nonce_key(public_key))? else {
            return Ok(Taken::Gone);
        };
        let taken: Challenge = entry.decode_json()?;
        if taken == *seen {
            return Ok(Taken::Ours);
        }
        self.storage.put_if_absent(entry)?;
        Ok(Taken::Replaced)
    }
}

enum Taken {
    Ours,
    Gone,
    Replaced,
}
