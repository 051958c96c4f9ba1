//! Typed request and response bodies for the boundary operations.
//!
//! Field names follow the JSON wire form: base-58 keys and signatures,
//! base64 message payloads.

use serde::{Deserialize, Serialize};

use crate::message::SigningMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateKeypairRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportKeypairRequest {
    pub id: String,
    /// Base-58 private key (64-byte keypair or 32-byte seed).
    pub private_key: String,
}

/// Returned by generate and import. Never carries the private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypairCreated {
    pub public_key: String,
}

/// Full keypair read. Redaction is up to whoever exposes this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypairResponse {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignMessageRequest {
    pub id: String,
    /// Base64-encoded message bytes.
    pub message: String,
    #[serde(default)]
    pub mode: SigningMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResponse {
    /// Base-58 signature.
    pub signature: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyMessageRequest {
    pub id: String,
    /// Base64-encoded message bytes.
    pub message: String,
    #[serde(default)]
    pub mode: SigningMode,
    /// Base-58 signature.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub nonce: String,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Config write. Omitted lifetimes fall back to the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteConfigRequest {
    #[serde(default)]
    pub token_policies: Vec<String>,
    #[serde(default)]
    pub token_ttl: Option<u64>,
    #[serde(default)]
    pub token_max_ttl: Option<u64>,
}
