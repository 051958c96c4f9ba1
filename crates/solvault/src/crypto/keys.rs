//! Ed25519 wallet keypairs and public keys in Solana's base-58 text form.
//!
//! A private key is carried in the 64-byte keypair layout used across the
//! Solana ecosystem: the 32-byte seed followed by the 32-byte public key.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{SigningKey, VerifyingKey, KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use zeroize::Zeroize;

use crate::crypto::random::{random_32, RandomSource};
use crate::error::{Result, VaultError};

/// An ed25519 public key, rendered as base-58 text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Decode a base-58 public key.
    ///
    /// Fails with `MalformedPublicKey` when the text is not base-58, is not
    /// 32 bytes long, or is not a valid curve point.
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| VaultError::MalformedPublicKey(format!("invalid base58: {e}")))?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            VaultError::MalformedPublicKey(format!(
                "expected {PUBLIC_KEY_LENGTH} bytes, got {}",
                v.len()
            ))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Reconstruct a public key from raw bytes.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> Result<Self> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| VaultError::MalformedPublicKey(format!("not a valid point: {e}")))
    }

    /// The underlying verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }

    /// Raw public key bytes.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Base-58 text form.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0.as_bytes()).into_string()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self(key)
    }
}

impl FromStr for PublicKey {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base58())
    }
}

/// An ed25519 keypair held in custody.
///
/// The public half is always derived from the seed, so a mismatched pair
/// cannot be constructed. `SigningKey` zeroizes the seed on drop.
pub struct WalletKeypair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl WalletKeypair {
    /// Draw a fresh keypair from `source`.
    pub fn generate(source: &dyn RandomSource) -> Result<Self> {
        let mut seed = random_32(source)?;
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        Ok(keypair)
    }

    /// Derive a keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let public_key = PublicKey(signing_key.verifying_key());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Reconstruct from private key bytes: either the 64-byte keypair layout
    /// (whose public half must match the derived key) or a bare 32-byte seed.
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            KEYPAIR_LENGTH => {
                let mut seed: [u8; SECRET_KEY_LENGTH] = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(&bytes[..SECRET_KEY_LENGTH]);
                let keypair = Self::from_seed(&seed);
                seed.zeroize();
                if keypair.public_key.to_bytes()[..] != bytes[SECRET_KEY_LENGTH..] {
                    return Err(VaultError::InvalidKeyMaterial(
                        "public half does not match the derived public key".into(),
                    ));
                }
                Ok(keypair)
            }
            SECRET_KEY_LENGTH => {
                let mut seed: [u8; SECRET_KEY_LENGTH] = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(bytes);
                let keypair = Self::from_seed(&seed);
                seed.zeroize();
                Ok(keypair)
            }
            n => Err(VaultError::InvalidKeyMaterial(format!(
                "expected {KEYPAIR_LENGTH} or {SECRET_KEY_LENGTH} bytes, got {n}"
            ))),
        }
    }

    /// Decode a base-58 private key (see [`WalletKeypair::from_private_bytes`]).
    pub fn from_base58(s: &str) -> Result<Self> {
        let mut bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| VaultError::InvalidKeyMaterial(format!("invalid base58: {e}")))?;
        let keypair = Self::from_private_bytes(&bytes);
        bytes.zeroize();
        keypair
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The 64-byte keypair layout (seed followed by public key). Caller must
    /// zeroize after use.
    pub fn to_keypair_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    /// Base-58 of the 64-byte keypair layout.
    pub fn private_key_base58(&self) -> String {
        let mut bytes = self.to_keypair_bytes();
        let encoded = bs58::encode(&bytes[..]).into_string();
        bytes.zeroize();
        encoded
    }
}

impl fmt::Debug for WalletKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKeypair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
