//! Cryptographic primitives for solvault.
//!
//! This module provides:
//! - Ed25519 wallet keypairs with base-58 text codecs
//! - Signing and verification over framed message bytes
//! - A pluggable cryptographically secure random source
//! - Passphrase-derived sealing keys for values at rest

pub mod keys;
pub mod random;
pub mod seal;
pub mod signing;

pub use keys::{PublicKey, WalletKeypair};
pub use random::{OsRandom, RandomSource};
