//! Solana off-chain message, version 0.
//!
//! Wire layout:
//! ```text
//! signing domain   16 bytes  b"\xffsolana offchain"
//! header version    1 byte   0
//! message format    1 byte   0 restricted ASCII, 1 limited UTF-8, 2 extended UTF-8
//! message length    2 bytes  little-endian
//! message body      n bytes
//! ```
//!
//! The leading `0xff` can never start a valid transaction, so signed
//! off-chain messages cannot be replayed as transactions.

use crate::error::{Result, VaultError};

/// Domain tag that starts every framed message.
pub const SIGNING_DOMAIN: &[u8; 16] = b"\xffsolana offchain";

/// Signing domain (16) + header version (1).
pub const BASE_HEADER_LEN: usize = SIGNING_DOMAIN.len() + 1;

/// Message format (1) + message length (2).
pub const V0_HEADER_LEN: usize = 3;

/// Full v0 preamble length.
pub const PREAMBLE_LEN: usize = BASE_HEADER_LEN + V0_HEADER_LEN;

/// Transaction packet size; bounds what hardware wallets will display.
const PACKET_DATA_SIZE: usize = 1232;

/// Largest body a ledger device accepts (restricted ASCII or limited UTF-8).
pub const MAX_LEN_LEDGER: usize = PACKET_DATA_SIZE - PREAMBLE_LEN;

/// Largest body the two-byte length field can describe with its preamble.
pub const MAX_LEN: usize = u16::MAX as usize - PREAMBLE_LEN;

/// The only header version defined so far.
pub const VERSION_0: u8 = 0;

/// Body encoding category, selected by length and content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageFormat {
    RestrictedAscii = 0,
    LimitedUtf8 = 1,
    ExtendedUtf8 = 2,
}

impl MessageFormat {
    /// Pick the narrowest format that can carry `body`.
    pub fn classify(body: &[u8]) -> Result<Self> {
        if body.is_empty() {
            return Err(VaultError::InvalidMessage("message body is empty".into()));
        }
        if body.len() > MAX_LEN {
            return Err(VaultError::MessageTooLong {
                len: body.len(),
                max: MAX_LEN,
            });
        }
        if body.len() <= MAX_LEN_LEDGER {
            if is_printable_ascii(body) {
                return Ok(Self::RestrictedAscii);
            }
            if std::str::from_utf8(body).is_ok() {
                return Ok(Self::LimitedUtf8);
            }
        } else if std::str::from_utf8(body).is_ok() {
            return Ok(Self::ExtendedUtf8);
        }
        Err(VaultError::InvalidMessage("message body is not valid UTF-8".into()))
    }
}

impl TryFrom<u8> for MessageFormat {
    type Error = VaultError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::RestrictedAscii),
            1 => Ok(Self::LimitedUtf8),
            2 => Ok(Self::ExtendedUtf8),
            other => Err(VaultError::InvalidMessage(format!(
                "unknown message format {other}"
            ))),
        }
    }
}

fn is_printable_ascii(data: &[u8]) -> bool {
    data.iter().all(|&c| (0x20..=0x7e).contains(&c))
}

/// A validated off-chain message ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffchainMessage {
    version: u8,
    format: MessageFormat,
    body: Vec<u8>,
}

impl OffchainMessage {
    /// Validate `body` for the given header version.
    pub fn new(version: u8, body: &[u8]) -> Result<Self> {
        if version != VERSION_0 {
            return Err(VaultError::UnsupportedVersion(version));
        }
        let format = MessageFormat::classify(body)?;
        Ok(Self {
            version,
            format,
            body: body.to_vec(),
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn format(&self) -> MessageFormat {
        self.format
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The exact bytes that get signed.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PREAMBLE_LEN + self.body.len());
        out.extend_from_slice(SIGNING_DOMAIN);
        out.push(self.version);
        out.push(self.format as u8);
        // MAX_LEN < u16::MAX, enforced by classify
        out.extend_from_slice(&(self.body.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    /// Parse framed bytes back into a message, rejecting anything that
    /// [`OffchainMessage::serialize`] would not have produced.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < PREAMBLE_LEN || !data.starts_with(SIGNING_DOMAIN) {
            return Err(VaultError::InvalidMessage("missing off-chain signing domain".into()));
        }
        let version = data[SIGNING_DOMAIN.len()];
        if version != VERSION_0 {
            return Err(VaultError::UnsupportedVersion(version));
        }
        let format = MessageFormat::try_from(data[BASE_HEADER_LEN])?;
        let len = u16::from_le_bytes([data[BASE_HEADER_LEN + 1], data[BASE_HEADER_LEN + 2]]) as usize;
        let body = &data[PREAMBLE_LEN..];
        if body.len() != len {
            return Err(VaultError::InvalidMessage(format!(
                "length field says {len} bytes, body has {}",
                body.len()
            )));
        }
        // only the narrowest format is canonical
        let canonical = MessageFormat::classify(body)?;
        if canonical != format {
            return Err(VaultError::InvalidMessage(format!(
                "format {format:?} declared for a {canonical:?} body"
            )));
        }
        Ok(Self {
            version,
            format,
            body: body.to_vec(),
        })
    }
}

/// Whether `data` starts with the off-chain signing domain.
pub fn is_offchain_framed(data: &[u8]) -> bool {
    data.starts_with(SIGNING_DOMAIN)
}
