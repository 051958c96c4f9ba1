//! At-rest sealing: ChaCha20-Poly1305 under a key derived from a passphrase.
//!
//! passphrase → Argon2id(passphrase, salt) → master key
//! HKDF-SHA256(master key, "solvault/seal") → sealing key

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::crypto::random::{random_nonce_12, RandomSource};
use crate::error::{Result, VaultError};

/// Argon2id parameters for passphrase-based key derivation.
const ARGON2_M_COST: u32 = 65536; // 64 MiB
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

/// HKDF context for the sealing key. Must remain stable across versions.
const SEAL_CONTEXT: &str = "solvault/seal";

/// A 32-byte symmetric sealing key. Zeroized on drop.
pub struct SealKey([u8; 32]);

impl SealKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the sealing key from a passphrase and a persisted salt.
    pub fn derive(passphrase: &[u8], salt: &[u8; 16]) -> Result<Self> {
        let mut master = derive_passphrase_key(passphrase, salt)?;
        let key = derive_subkey(&master, SEAL_CONTEXT);
        master.zeroize();
        Ok(Self(key?))
    }

    /// Encrypt `plaintext` bound to `context`, returning `(nonce, ciphertext)`.
    ///
    /// `context` is authenticated but not encrypted; the same value must be
    /// presented to [`SealKey::open`].
    pub fn seal(
        &self,
        random: &dyn RandomSource,
        plaintext: &[u8],
        context: &str,
    ) -> Result<([u8; 12], Vec<u8>)> {
        let nonce_bytes = random_nonce_12(random)?;
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| VaultError::SealFailed(format!("cipher init: {e}")))?;
        let payload = Payload {
            msg: plaintext,
            aad: context.as_bytes(),
        };
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), payload)
            .map_err(|e| VaultError::SealFailed(format!("encrypt: {e}")))?;
        Ok((nonce_bytes, ciphertext))
    }

    /// Decrypt a value sealed under `context`.
    pub fn open(&self, nonce: &[u8; 12], ciphertext: &[u8], context: &str) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| VaultError::SealFailed(format!("cipher init: {e}")))?;
        let payload = Payload {
            msg: ciphertext,
            aad: context.as_bytes(),
        };
        cipher
            .decrypt(Nonce::from_slice(nonce), payload)
            .map_err(|_| VaultError::UnsealFailed(context.to_string()))
    }
}

impl Drop for SealKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Derive a 32-byte key from a passphrase and salt using Argon2id.
fn derive_passphrase_key(passphrase: &[u8], salt: &[u8; 16]) -> Result<[u8; 32]> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|e| VaultError::SealFailed(format!("Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| VaultError::SealFailed(format!("Argon2 hash: {e}")))?;
    Ok(output)
}

/// Expand a master key into a context-scoped subkey with HKDF-SHA256.
fn derive_subkey(master: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, master);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| VaultError::SealFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}
