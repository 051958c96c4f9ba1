//! Message framing: the exact bytes that get signed or verified.
//!
//! Two modes exist. `Raw` signs the message bytes as given. `Offchain`
//! prefixes the Solana off-chain message preamble (see [`offchain`]) so the
//! signature interoperates with wallets and other implementations of that
//! convention. Challenge nonces are always signed in `Offchain` mode.

pub mod offchain;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use offchain::{is_offchain_framed, MessageFormat, OffchainMessage, SIGNING_DOMAIN};

/// How a logical message becomes signed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningMode {
    /// Message bytes, unmodified.
    Raw,
    /// Off-chain preamble (version 0) followed by the message body.
    #[default]
    Offchain,
}

impl std::str::FromStr for SigningMode {
    type Err = crate::error::VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Self::Raw),
            "offchain" => Ok(Self::Offchain),
            other => Err(crate::error::VaultError::InvalidEncoding(format!(
                "unknown signing mode '{other}' (expected raw or offchain)"
            ))),
        }
    }
}

/// Produce the bytes to sign for `message` under `mode`.
pub fn frame(message: &[u8], mode: SigningMode) -> Result<Vec<u8>> {
    match mode {
        SigningMode::Raw => Ok(message.to_vec()),
        SigningMode::Offchain => {
            Ok(OffchainMessage::new(offchain::VERSION_0, message)?.serialize())
        }
    }
}
