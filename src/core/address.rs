//! Account and Session Identifiers
//!
//! Fixed-width byte identifiers used throughout the ledger.
//! Both implement Ord for deterministic BTreeMap/BTreeSet ordering.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::hash::hash_with_domain;

/// Domain separator for label-derived addresses.
const LABEL_DOMAIN: &[u8] = b"SCORE_LEDGER_LABEL_V1";

/// Errors parsing a hex identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// Input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    /// Decoded length is not 32 bytes.
    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

fn decode_32(s: &str) -> Result<[u8; 32], IdParseError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|e| IdParseError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(IdParseError::InvalidLength(bytes.len()));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

// =============================================================================
// ADDRESS
// =============================================================================

/// A ledger account (player, agent, treasury, vault, or signer key).
///
/// For the score signer this is the Ed25519 verifying key bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The empty address. Used for unfilled leaderboard slots.
    pub const ZERO: Address = Address([0; 32]);

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a stable address from a human-readable label.
    pub fn from_label(label: &str) -> Self {
        Self(hash_with_domain(LABEL_DOMAIN, label.as_bytes()))
    }

    /// Parse from a 64-char hex string (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, IdParseError> {
        decode_32(s).map(Self)
    }

    /// Full hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 4 bytes as hex, for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Is this the empty address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

// =============================================================================
// SESSION ID
// =============================================================================

/// Identifier of one signed game session. Consumable exactly once.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SessionId(pub [u8; 32]);

impl SessionId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a 64-char hex string (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, IdParseError> {
        decode_32(s).map(Self)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 4 bytes as hex, for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.short())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
