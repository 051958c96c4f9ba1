//! Secure random number generation.
//!
//! The random source is a collaborator held by the service object. The
//! default uses the operating system's cryptographic random source via
//! `rand`; failures propagate as infrastructure faults instead of panicking.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, VaultError};

/// A cryptographically secure source of random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill `buf` entirely with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// Operating-system entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| VaultError::RandomSource(e.to_string()))
    }
}

/// Generate a fixed-size array of random bytes from `source`.
pub fn random_bytes<const N: usize>(source: &dyn RandomSource) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    source.fill(&mut buf)?;
    Ok(buf)
}

/// Generate a random 32-byte value (key seeds, challenge nonces).
pub fn random_32(source: &dyn RandomSource) -> Result<[u8; 32]> {
    random_bytes(source)
}

/// Generate a random 12-byte nonce (for ChaCha20-Poly1305).
pub fn random_nonce_12(source: &dyn RandomSource) -> Result<[u8; 12]> {
    random_bytes(source)
}

/// Generate a random 16-byte salt.
pub fn random_salt_16(source: &dyn RandomSource) -> Result<[u8; 16]> {
    random_bytes(source)
}
