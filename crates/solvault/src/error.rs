//! Error types for solvault.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material, signatures, and nonces are never included in
//! error messages.

use crate::auth::login::Rejection;

/// Error types covering custody, framing, signing, and authentication.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("missing or empty {0}")]
    MissingField(&'static str),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("malformed public key: {0}")]
    MalformedPublicKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("message too long: {len} bytes exceeds maximum of {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("unsupported off-chain message version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("wallet already exists: {0}")]
    AlreadyExists(String),

    #[error("wallet not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Rejected(Rejection),

    #[error("corrupt record at {0}")]
    CorruptRecord(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("random source failure: {0}")]
    RandomSource(String),

    #[error("sealing failed: {0}")]
    SealFailed(String),

    #[error("unsealing failed for {0}")]
    UnsealFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Whether the error is the caller's fault (validation, state, or
    /// rejection) rather than an infrastructure fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            VaultError::CorruptRecord(_)
                | VaultError::StorageError(_)
                | VaultError::SerializationError(_)
                | VaultError::RandomSource(_)
                | VaultError::SealFailed(_)
                | VaultError::UnsealFailed(_)
                | VaultError::Io(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, VaultError>;
