//! Ledger Errors
//!
//! Every engine call fails with exactly one of these. All are terminal for
//! the call that raised them and leave shared state untouched.

use thiserror::Error;

use crate::core::{SessionId, TokenAmount, UnixSeconds};
use crate::external::token::TokenError;

/// Engine failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Signature does not verify under the configured score signer.
    #[error("invalid signature")]
    InvalidSignature,

    /// Signature is older than the freshness window.
    #[error("signature expired: signed at {signed_at}, now {now}")]
    ExpiredSignature {
        /// When the payload was signed.
        signed_at: UnixSeconds,
        /// Verification time.
        now: UnixSeconds,
    },

    /// Session was already consumed by an earlier submission.
    #[error("session {0} already consumed")]
    ReplayedSession(SessionId),

    /// A mint would push total supply over the cap.
    #[error("max supply exceeded: requested {requested}, available {available}")]
    SupplyExceeded {
        /// Amount the operation needed to mint.
        requested: TokenAmount,
        /// Headroom left under the cap.
        available: TokenAmount,
    },

    /// Epoch end time not reached.
    #[error("epoch {epoch_id} has not ended (ends at {ends_at})")]
    EpochNotEnded {
        /// Epoch being settled.
        epoch_id: u64,
        /// Its end time.
        ends_at: UnixSeconds,
    },

    /// Epoch was settled before.
    #[error("epoch {0} already settled")]
    AlreadySettled(u64),

    /// No epoch with this id.
    #[error("unknown epoch {0}")]
    UnknownEpoch(u64),

    /// Admin capability does not belong to this engine.
    #[error("unauthorized")]
    Unauthorized,

    /// Configuration rejected.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Token ledger refused an operation the engine had already checked.
    #[error("token ledger: {0}")]
    Token(TokenError),
}

impl From<TokenError> for LedgerError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MaxSupplyExceeded { requested, available } => {
                Self::SupplyExceeded { requested, available }
            }
            other => Self::Token(other),
        }
    }
}

impl LedgerError {
    /// Short stable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredSignature { .. } => "expired_signature",
            Self::ReplayedSession(_) => "replayed_session",
            Self::SupplyExceeded { .. } => "supply_exceeded",
            Self::EpochNotEnded { .. } => "epoch_not_ended",
            Self::AlreadySettled(_) => "already_settled",
            Self::UnknownEpoch(_) => "unknown_epoch",
            Self::Unauthorized => "unauthorized",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Token(_) => "token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_error_maps_to_supply_exceeded() {
        let err: LedgerError = TokenError::MaxSupplyExceeded { requested: 5, available: 2 }.into();
        assert_eq!(err, LedgerError::SupplyExceeded { requested: 5, available: 2 });
        assert_eq!(err.kind(), "supply_exceeded");
    }

    #[test]
    fn test_other_token_errors_are_wrapped() {
        let inner = TokenError::InsufficientBalance { needed: 3, available: 1 };
        let err: LedgerError = inner.clone().into();
        assert_eq!(err, LedgerError::Token(inner));
    }
}
