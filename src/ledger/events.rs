//! Ledger Events
//!
//! Notifications emitted by engine calls for leaderboard UIs and APIs.
//! Events are returned with each call's outcome in emission order; the
//! service layer also broadcasts them.

use serde::{Serialize, Deserialize};

use crate::core::{Address, SessionId, TokenAmount, UnixSeconds};

/// Why tokens were minted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintReason {
    /// Kills/rounds reward for a submission.
    Gameplay,
    /// Epoch prize for the human winner.
    HumanPrize,
    /// Epoch prize for the agent winner.
    AgentPrize,
    /// Treasury allocation at settlement.
    Treasury,
}

/// A ledger notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A score was accepted.
    ScoreSubmitted {
        /// Submitter.
        player: Address,
        /// Reported score.
        score: u64,
        /// Round reached.
        round: u64,
        /// Kills made.
        kills: u64,
        /// Submitter is an agent.
        is_agent: bool,
        /// Epoch the score counts towards.
        epoch_id: u64,
        /// Consumed session.
        session_id: SessionId,
    },

    /// An entry fee was charged and split.
    FeeCollected {
        /// Payer.
        player: Address,
        /// Fee charged.
        amount: TokenAmount,
        /// Epoch credited.
        epoch_id: u64,
    },

    /// A submission landed on a leaderboard.
    LeaderboardUpdated {
        /// Agent board rather than human.
        is_agent: bool,
        /// 1-based.
        rank: usize,
        /// Entry owner.
        player: Address,
        /// Entry score.
        score: u64,
    },

    /// Tokens were minted to a recipient.
    RewardMinted {
        /// Recipient.
        player: Address,
        /// Amount minted.
        amount: TokenAmount,
        /// Why.
        reason: MintReason,
    },

    /// The burn share was minted to the vault and burned.
    TokensBurned {
        /// Epoch whose burn share this was.
        epoch_id: u64,
        /// Amount burned.
        amount: TokenAmount,
    },

    /// An epoch was paid out.
    EpochSettled {
        /// Settled epoch.
        epoch_id: u64,
        /// Human category leader.
        human_winner: Option<Address>,
        /// Minted to the human winner.
        human_prize: TokenAmount,
        /// Agent category leader.
        agent_winner: Option<Address>,
        /// Minted to the agent winner.
        agent_prize: TokenAmount,
        /// Minted and burned.
        burned: TokenAmount,
        /// Minted to the treasury, rounding dust included.
        treasury: TokenAmount,
    },

    /// A new epoch opened.
    EpochStarted {
        /// New epoch.
        epoch_id: u64,
        /// Opening time.
        start_time: UnixSeconds,
        /// Earliest settlement time.
        end_time: UnixSeconds,
    },
}

impl LedgerEvent {
    /// Event name as serialized in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScoreSubmitted { .. } => "score_submitted",
            Self::FeeCollected { .. } => "fee_collected",
            Self::LeaderboardUpdated { .. } => "leaderboard_updated",
            Self::RewardMinted { .. } => "reward_minted",
            Self::TokensBurned { .. } => "tokens_burned",
            Self::EpochSettled { .. } => "epoch_settled",
            Self::EpochStarted { .. } => "epoch_started",
        }
    }

    /// JSON encoding for external consumers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_tag_matches_name() {
        let events = [
            LedgerEvent::EpochStarted { epoch_id: 2, start_time: 10, end_time: 20 },
            LedgerEvent::TokensBurned { epoch_id: 1, amount: 4 },
            LedgerEvent::RewardMinted {
                player: Address::new([1; 32]),
                amount: 5,
                reason: MintReason::Gameplay,
            },
        ];

        for event in events {
            let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn test_mint_reason_serialization() {
        let json = serde_json::to_string(&MintReason::HumanPrize).unwrap();
        assert_eq!(json, "\"human_prize\"");
    }
}
