//! Score Signature Verification
//!
//! Scores are authorized off-core by a trusted Ed25519 score signer.
//! The engine only validates; it never issues signatures in production.
//!
//! ## Signed message
//!
//! ```text
//! payload = SHA256("SCORE_LEDGER_PAYLOAD_V1" ‖ submitter ‖ score ‖ round
//!                  ‖ kills ‖ session_id ‖ signed_at ‖ domain_id)
//! message = SHA256("\x19Score Ledger Signed Message:\n32" ‖ payload)
//! ```
//!
//! Integers are little-endian u64. The domain id pins a signature to one
//! deployment so it cannot be replayed against another.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Serialize, Deserialize};

use crate::core::constants::FRESHNESS_WINDOW_SECS;
use crate::core::hash::{Hash32, PayloadHasher};
use crate::core::{Address, SessionId, UnixSeconds};
use crate::ledger::error::LedgerError;

/// Domain separator for payload digests.
const PAYLOAD_DOMAIN: &[u8] = b"SCORE_LEDGER_PAYLOAD_V1";

/// Prefix applied to the payload digest before signing.
const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Score Ledger Signed Message:\n32";

/// A score report as received from a client. Never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    /// Authenticated caller.
    pub submitter: Address,
    /// Final score.
    pub score: u64,
    /// Round reached.
    pub round: u64,
    /// Kills made.
    pub kills: u64,
    /// Session being reported.
    pub session_id: SessionId,
    /// When the signer authorized the payload.
    pub signed_at: UnixSeconds,
    /// Ed25519 signature (64 bytes when well-formed).
    pub signature: Vec<u8>,
}

impl ScoreSubmission {
    /// Build an unsigned submission.
    pub fn unsigned(
        submitter: Address,
        score: u64,
        round: u64,
        kills: u64,
        session_id: SessionId,
        signed_at: UnixSeconds,
    ) -> Self {
        Self {
            submitter,
            score,
            round,
            kills,
            session_id,
            signed_at,
            signature: Vec::new(),
        }
    }

    /// Digest of the signed fields.
    pub fn payload_digest(&self, domain_id: u64) -> Hash32 {
        let mut hasher = PayloadHasher::new(PAYLOAD_DOMAIN);
        hasher.update_id(self.submitter.as_bytes());
        hasher.update_u64(self.score);
        hasher.update_u64(self.round);
        hasher.update_u64(self.kills);
        hasher.update_id(self.session_id.as_bytes());
        hasher.update_u64(self.signed_at);
        hasher.update_u64(domain_id);
        hasher.finalize()
    }

    /// The exact bytes the signer signs.
    pub fn signed_message(&self, domain_id: u64) -> Hash32 {
        let mut hasher = PayloadHasher::new(SIGNED_MESSAGE_PREFIX);
        hasher.update_bytes(&self.payload_digest(domain_id));
        hasher.finalize()
    }
}

/// Validates score signatures against the trusted signer.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    signer: Address,
    domain_id: u64,
}

impl SignatureVerifier {
    /// Create a verifier for one signer and deployment domain.
    pub fn new(signer: Address, domain_id: u64) -> Self {
        Self { signer, domain_id }
    }

    /// Trusted signer.
    pub fn signer(&self) -> Address {
        self.signer
    }

    /// Check freshness and signature. Pure.
    pub fn verify(&self, submission: &ScoreSubmission, now: UnixSeconds) -> Result<(), LedgerError> {
        if now > submission.signed_at.saturating_add(FRESHNESS_WINDOW_SECS) {
            return Err(LedgerError::ExpiredSignature {
                signed_at: submission.signed_at,
                now,
            });
        }

        let key = VerifyingKey::from_bytes(self.signer.as_bytes())
            .map_err(|_| LedgerError::InvalidSignature)?;
        let signature = Signature::from_slice(&submission.signature)
            .map_err(|_| LedgerError::InvalidSignature)?;

        let message = submission.signed_message(self.domain_id);
        key.verify_strict(&message, &signature)
            .map_err(|_| LedgerError::InvalidSignature)
    }
}

/// The off-core score signer.
///
/// Lives here so collaborators and tests sign exactly what the verifier
/// checks.
pub struct ScoreSigner {
    key: SigningKey,
}

impl ScoreSigner {
    /// Create from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { key: SigningKey::from_bytes(&seed) }
    }

    /// Signer address (verifying key bytes).
    pub fn address(&self) -> Address {
        Address::new(self.key.verifying_key().to_bytes())
    }

    /// Sign a submission for a domain.
    pub fn sign(&self, mut submission: ScoreSubmission, domain_id: u64) -> ScoreSubmission {
        let message = submission.signed_message(domain_id);
        submission.signature = self.key.sign(&message).to_bytes().to_vec();
        submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: u64 = 31337;

    fn signer() -> ScoreSigner {
        ScoreSigner::from_seed([7; 32])
    }

    fn submission(signed_at: UnixSeconds) -> ScoreSubmission {
        ScoreSubmission::unsigned(
            Address::new([1; 32]),
            1200,
            7,
            3,
            SessionId::new([9; 32]),
            signed_at,
        )
    }

    #[test]
    fn test_valid_signature_accepted() {
        let signer = signer();
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let signed = signer.sign(submission(1000), DOMAIN);

        assert_eq!(verifier.verify(&signed, 1000), Ok(()));
    }

    #[test]
    fn test_freshness_window_boundary() {
        let signer = signer();
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let signed = signer.sign(submission(1000), DOMAIN);

        assert!(verifier.verify(&signed, 1000 + 299).is_ok());
        assert!(verifier.verify(&signed, 1000 + 300).is_ok());
        assert_eq!(
            verifier.verify(&signed, 1000 + 301),
            Err(LedgerError::ExpiredSignature { signed_at: 1000, now: 1301 })
        );
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let signer = signer();
        let impostor = ScoreSigner::from_seed([8; 32]);
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let forged = impostor.sign(submission(1000), DOMAIN);

        assert_eq!(verifier.verify(&forged, 1000), Err(LedgerError::InvalidSignature));
    }

    #[test]
    fn test_tampered_score_rejected() {
        let signer = signer();
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let mut signed = signer.sign(submission(1000), DOMAIN);
        signed.score += 1;

        assert_eq!(verifier.verify(&signed, 1000), Err(LedgerError::InvalidSignature));
    }

    #[test]
    fn test_other_submitter_cannot_reuse_signature() {
        let signer = signer();
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let mut signed = signer.sign(submission(1000), DOMAIN);
        signed.submitter = Address::new([2; 32]);

        assert_eq!(verifier.verify(&signed, 1000), Err(LedgerError::InvalidSignature));
    }

    #[test]
    fn test_domain_binding() {
        let signer = signer();
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let signed = signer.sign(submission(1000), DOMAIN + 1);

        assert_eq!(verifier.verify(&signed, 1000), Err(LedgerError::InvalidSignature));
    }

    #[test]
    fn test_malformed_signature_bytes() {
        let signer = signer();
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let mut signed = signer.sign(submission(1000), DOMAIN);
        signed.signature.truncate(10);

        assert_eq!(verifier.verify(&signed, 1000), Err(LedgerError::InvalidSignature));

        signed.signature.clear();
        assert_eq!(verifier.verify(&signed, 1000), Err(LedgerError::InvalidSignature));
    }

    #[test]
    fn test_future_signed_at_accepted() {
        let signer = signer();
        let verifier = SignatureVerifier::new(signer.address(), DOMAIN);
        let signed = signer.sign(submission(5000), DOMAIN);

        assert!(verifier.verify(&signed, 1000).is_ok());
    }

    #[test]
    fn test_payload_digest_covers_every_field() {
        let base = submission(1000);
        let digest = base.payload_digest(DOMAIN);

        let variants = [
            ScoreSubmission { score: 1, ..base.clone() },
            ScoreSubmission { round: 1, ..base.clone() },
            ScoreSubmission { kills: 1, ..base.clone() },
            ScoreSubmission { session_id: SessionId::new([0; 32]), ..base.clone() },
            ScoreSubmission { signed_at: 1, ..base.clone() },
        ];
        for v in variants {
            assert_ne!(v.payload_digest(DOMAIN), digest);
        }
        assert_ne!(base.payload_digest(DOMAIN + 1), digest);
    }
}
