//! Ed25519 signing and verification over framed message bytes.
//!
//! No hashing is applied beyond what ed25519 itself mandates. The framing
//! step is delegated to [`crate::message`] so that the custodial signing path
//! and the authentication path share one wire format.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SIGNATURE_LENGTH};

use crate::crypto::keys::{PublicKey, WalletKeypair};
use crate::error::{Result, VaultError};
use crate::message::{frame, SigningMode};

/// Sign already-framed bytes.
pub fn sign(signing_key: &SigningKey, framed: &[u8]) -> Signature {
    signing_key.sign(framed)
}

/// Verify a signature over already-framed bytes.
///
/// Returns `false` for any cryptographically wrong signature; the caller
/// cannot tell a wrong key from a tampered message.
pub fn verify(verifying_key: &VerifyingKey, framed: &[u8], signature: &Signature) -> bool {
    verifying_key.verify(framed, signature).is_ok()
}

/// Decode a base-58 signature into its fixed 64-byte representation.
pub fn signature_from_base58(s: &str) -> Result<Signature> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| VaultError::MalformedSignature(format!("invalid base58: {e}")))?;
    let bytes: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
        VaultError::MalformedSignature(format!(
            "expected {SIGNATURE_LENGTH} bytes, got {}",
            v.len()
        ))
    })?;
    Ok(Signature::from_bytes(&bytes))
}

/// Encode a signature as base-58 text.
pub fn signature_to_base58(signature: &Signature) -> String {
    bs58::encode(signature.to_bytes()).into_string()
}

/// Verify base-58 encoded inputs over framed bytes.
///
/// Fails only when the public key or signature cannot be decoded.
pub fn verify_encoded(public_key_b58: &str, framed: &[u8], signature_b58: &str) -> Result<bool> {
    let public_key = PublicKey::from_base58(public_key_b58)?;
    let signature = signature_from_base58(signature_b58)?;
    Ok(verify(public_key.verifying_key(), framed, &signature))
}

/// Frame `message` under `mode` and sign it with `keypair`.
pub fn sign_message(keypair: &WalletKeypair, message: &[u8], mode: SigningMode) -> Result<Signature> {
    let framed = frame(message, mode)?;
    Ok(sign(keypair.signing_key(), &framed))
}

/// Frame `message` under `mode` and verify `signature` against it.
pub fn verify_message(
    public_key: &PublicKey,
    message: &[u8],
    mode: SigningMode,
    signature: &Signature,
) -> Result<bool> {
    let framed = frame(message, mode)?;
    Ok(verify(public_key.verifying_key(), &framed, signature))
}
