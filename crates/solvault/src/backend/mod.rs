//! The service object behind every boundary operation.
//!
//! A [`Backend`] is built once at startup with its storage, random source,
//! and clock, and every operation goes through it. Requests arrive already
//! typed; anything a caller got wrong comes back as a client error
//! ([`VaultError::is_client_error`]), while storage and entropy failures
//! propagate as internal faults.

pub mod types;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::auth::{AuthConfig, Authenticator, Grant, LoginOutcome, LoginRequest};
use crate::crypto::random::{OsRandom, RandomSource};
use crate::crypto::signing::{self, signature_from_base58, signature_to_base58};
use crate::custody::KeyCustody;
use crate::error::{Result, VaultError};
use crate::storage::Storage;
use crate::time::{Clock, SystemClock};

pub use types::*;

/// Custody, signing, and login over one set of collaborators.
#[derive(Clone)]
pub struct Backend {
    storage: Arc<dyn Storage>,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl Backend {
    /// Use OS entropy and the system clock.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_collaborators(storage, Arc::new(OsRandom), Arc::new(SystemClock))
    }

    pub fn with_collaborators(
        storage: Arc<dyn Storage>,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            random,
            clock,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    fn custody(&self) -> KeyCustody<'_> {
        KeyCustody::new(self.storage.as_ref(), self.random.as_ref())
    }

    fn authenticator(&self) -> Authenticator<'_> {
        Authenticator::new(self.storage.as_ref(), self.random.as_ref(), self.clock.as_ref())
    }

    // ── Keypair custody ──────────────────────────────────────────────────────

    pub fn generate_keypair(&self, req: &GenerateKeypairRequest) -> Result<KeypairCreated> {
        let public_key = self.custody().generate(&req.id)?;
        Ok(KeypairCreated {
            public_key: public_key.to_base58(),
        })
    }

    pub fn import_keypair(&self, req: &ImportKeypairRequest) -> Result<KeypairCreated> {
        let public_key = self.custody().import(&req.id, &req.private_key)?;
        Ok(KeypairCreated {
            public_key: public_key.to_base58(),
        })
    }

    pub fn read_keypair(&self, id: &str) -> Result<KeypairResponse> {
        let keypair = self.custody().get(id)?;
        Ok(KeypairResponse {
            private_key: keypair.private_key_base58(),
            public_key: keypair.public_key().to_base58(),
        })
    }

    pub fn read_public_key(&self, id: &str) -> Result<PublicKeyResponse> {
        let public_key = self.custody().public_key(id)?;
        Ok(PublicKeyResponse {
            public_key: public_key.to_base58(),
        })
    }

    pub fn delete_keypair(&self, id: &str) -> Result<()> {
        self.custody().delete(id)
    }

    pub fn list_keypairs(&self) -> Result<ListResponse> {
        Ok(ListResponse {
            keys: self.custody().list()?,
        })
    }

    // ── Message signing ──────────────────────────────────────────────────────

    pub fn sign_message(&self, req: &SignMessageRequest) -> Result<SignatureResponse> {
        let message = decode_message(&req.message)?;
        let keypair = self.custody().get(&req.id)?;
        let signature = signing::sign_message(&keypair, &message, req.mode)?;
        log::debug!("signed {} byte message with wallet {} ({:?})", message.len(), req.id, req.mode);
        Ok(SignatureResponse {
            signature: signature_to_base58(&signature),
        })
    }

    pub fn verify_message(&self, req: &VerifyMessageRequest) -> Result<VerifyResponse> {
        let message = decode_message(&req.message)?;
        if req.signature.is_empty() {
            return Err(VaultError::MissingField("signature"));
        }
        let signature = signature_from_base58(&req.signature)?;
        let public_key = self.custody().public_key(&req.id)?;
        let verified = signing::verify_message(&public_key, &message, req.mode, &signature)?;
        Ok(VerifyResponse { verified })
    }

    // ── Authentication ───────────────────────────────────────────────────────

    pub fn issue_challenge(&self, req: &ChallengeRequest) -> Result<ChallengeResponse> {
        let challenge = self.authenticator().request_challenge(&req.public_key)?;
        Ok(ChallengeResponse {
            nonce: challenge.nonce,
            expires_at: challenge.expires_at,
        })
    }

    /// Log in; a rejection comes back as [`VaultError::Rejected`].
    pub fn authenticate(&self, req: &LoginRequest) -> Result<Grant> {
        match self.authenticator().authenticate(req)? {
            LoginOutcome::Granted(grant) => Ok(grant),
            LoginOutcome::Rejected(reason) => Err(VaultError::Rejected(reason)),
        }
    }

    pub fn read_config(&self) -> Result<AuthConfig> {
        AuthConfig::load(self.storage.as_ref())
    }

    pub fn write_config(&self, req: &WriteConfigRequest) -> Result<AuthConfig> {
        let defaults = AuthConfig::default();
        let config = AuthConfig::new(
            &req.token_policies,
            req.token_ttl.unwrap_or(defaults.token_ttl),
            req.token_max_ttl.unwrap_or(defaults.token_max_ttl),
        )?;
        config.save(self.storage.as_ref())?;
        Ok(config)
    }
}

fn decode_message(message_b64: &str) -> Result<Vec<u8>> {
    if message_b64.is_empty() {
        return Err(VaultError::MissingField("message"));
    }
    STANDARD
        .decode(message_b64)
        .map_err(|e| VaultError::InvalidEncoding(format!("invalid base64 message: {e}")))
}
