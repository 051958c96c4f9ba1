//! Challenge-response authentication.
//!
//! - [`challenge`]: nonce issuance and single-use consumption.
//! - [`config`]: policies and token lifetimes bound to a login.
//! - [`login`]: the login decision and the resulting grant.

pub mod challenge;
pub mod config;
pub mod login;

pub use challenge::{Challenge, ChallengeRegistry, ConsumeOutcome, CHALLENGE_TTL_SECS, NONCE_DOMAIN};
pub use config::AuthConfig;
pub use login::{Authenticator, Grant, LoginOutcome, LoginRequest, Rejection};
