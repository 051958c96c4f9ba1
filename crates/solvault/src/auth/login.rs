//! Challenge-response login.
//!
//! A caller asks for a challenge for the public key it claims, signs the
//! nonce as an off-chain message with the matching private key, and submits
//! `(public key, nonce, signature)`. The challenge is consumed before the
//! signature is checked, so a bad signature costs the caller its challenge
//! and every guess needs a fresh one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::challenge::{Challenge, ChallengeRegistry, ConsumeOutcome};
use super::config::AuthConfig;
use crate::crypto::keys::PublicKey;
use crate::crypto::random::RandomSource;
use crate::crypto::signing::{signature_from_base58, verify};
use crate::error::{Result, VaultError};
use crate::message::{frame, SigningMode};
use crate::storage::Storage;
use crate::time::Clock;

/// A login attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub public_key: String,
    pub nonce: String,
    pub signature: String,
}

/// The session description handed back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Authenticated public key, the durable identity of the session.
    pub identity: String,
    pub display_name: String,
    pub policies: Vec<String>,
    pub ttl: u64,
    pub max_ttl: u64,
    pub renewable: bool,
    pub metadata: BTreeMap<String, String>,
}

impl Grant {
    fn new(identity: &PublicKey, config: AuthConfig) -> Self {
        let identity = identity.to_base58();
        let short: String = identity.chars().take(8).collect();
        let mut metadata = BTreeMap::new();
        metadata.insert("public_key".to_string(), identity.clone());
        Self {
            display_name: format!("solana-{short}"),
            identity,
            policies: config.token_policies,
            ttl: config.token_ttl,
            max_ttl: config.token_max_ttl,
            renewable: true,
            metadata,
        }
    }
}

/// Why a login attempt was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingField(&'static str),
    InvalidIdentity,
    MalformedSignature,
    NoChallenge,
    Expired,
    NonceMismatch,
    SignatureInvalid,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingField(field) => write!(f, "missing or empty {field}"),
            Rejection::InvalidIdentity => f.write_str("invalid public key"),
            Rejection::MalformedSignature => f.write_str("malformed signature"),
            Rejection::NoChallenge => f.write_str("no challenge"),
            Rejection::Expired => f.write_str("expired"),
            Rejection::NonceMismatch => f.write_str("nonce mismatch"),
            Rejection::SignatureInvalid => f.write_str("signature verification failed"),
        }
    }
}

/// Terminal result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted(Grant),
    Rejected(Rejection),
}

impl LoginOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, LoginOutcome::Granted(_))
    }
}

/// Parse a claimed public key, mapping any decoding failure to `InvalidIdentity`.
pub fn parse_identity(claimed: &str) -> Result<PublicKey> {
    if claimed.is_empty() {
        return Err(VaultError::InvalidIdentity("public key is empty".into()));
    }
    PublicKey::from_base58(claimed).map_err(|e| VaultError::InvalidIdentity(e.to_string()))
}

/// Orchestrates challenge issuance and login verification.
pub struct Authenticator<'a> {
    storage: &'a dyn Storage,
    registry: ChallengeRegistry<'a>,
}

impl<'a> Authenticator<'a> {
    pub fn new(storage: &'a dyn Storage, random: &'a dyn RandomSource, clock: &'a dyn Clock) -> Self {
        Self {
            storage,
            registry: ChallengeRegistry::new(storage, random, clock),
        }
    }

    /// Issue a challenge for the claimed public key.
    pub fn request_challenge(&self, claimed: &str) -> Result<Challenge> {
        let public_key = parse_identity(claimed)?;
        self.registry.issue(&public_key)
    }

    /// Decide a login attempt.
    ///
    /// Rejections are `Ok(LoginOutcome::Rejected(_))`; only storage and
    /// other infrastructure faults are `Err`.
    pub fn authenticate(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        for (name, value) in [
            ("public key", &request.public_key),
            ("nonce", &request.nonce),
            ("signature", &request.signature),
        ] {
            if value.is_empty() {
                return Ok(reject(&request.public_key, Rejection::MissingField(name)));
            }
        }

        // Undecodable inputs are turned away before they can burn a challenge.
        let Ok(public_key) = parse_identity(&request.public_key) else {
            return Ok(reject(&request.public_key, Rejection::InvalidIdentity));
        };
        let Ok(signature) = signature_from_base58(&request.signature) else {
            return Ok(reject(&request.public_key, Rejection::MalformedSignature));
        };

        let challenge = match self.registry.consume(&public_key, &request.nonce)? {
            ConsumeOutcome::Ok(challenge) => challenge,
            ConsumeOutcome::NotFound => return Ok(reject(&request.public_key, Rejection::NoChallenge)),
            ConsumeOutcome::Expired => return Ok(reject(&request.public_key, Rejection::Expired)),
            ConsumeOutcome::Mismatch => {
                return Ok(reject(&request.public_key, Rejection::NonceMismatch))
            }
        };

        let framed = frame(challenge.nonce.as_bytes(), SigningMode::Offchain)?;
        if !verify(public_key.verifying_key(), &framed, &signature) {
            return Ok(reject(&request.public_key, Rejection::SignatureInvalid));
        }

        let config = AuthConfig::load(self.storage)?;
        let grant = Grant::new(&public_key, config);
        log::info!(
            "login granted for {} with {} policies",
            grant.identity,
            grant.policies.len()
        );
        Ok(LoginOutcome::Granted(grant))
    }
}

fn reject(public_key: &str, reason: Rejection) -> LoginOutcome {
    log::warn!("login rejected for {public_key:?}: {reason}");
    LoginOutcome::Rejected(reason)
}
