//! solvault: custodial Solana keypairs and challenge-response login.
//!
//! Provides keypair custody, message signing and verification with the
//! Solana off-chain message preamble, and single-use time-bounded
//! challenges that let a caller prove control of a private key in
//! exchange for a policy-scoped grant.

pub mod auth;
pub mod backend;
pub mod crypto;
pub mod custody;
pub mod error;
pub mod message;
pub mod storage;
pub mod time;

// Re-export primary types
pub use auth::{AuthConfig, Challenge, Grant, LoginOutcome, LoginRequest, Rejection};
pub use backend::Backend;
pub use crypto::{OsRandom, PublicKey, RandomSource, WalletKeypair};
pub use custody::KeyCustody;
pub use error::{Result, VaultError};
pub use message::{frame, SigningMode};
pub use storage::{FileStorage, MemoryStorage, SealedStorage, Storage, StorageEntry};
pub use time::{Clock, ManualClock, SystemClock};
