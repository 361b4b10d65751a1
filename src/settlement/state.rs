//! Ledger State
//!
//! The durable part of the engine: everything that must survive a restart.
//! Token balances and agent stats belong to their own collaborators.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::constants::{TokenAmount, UnixSeconds};
use crate::core::Address;
use crate::ledger::epoch::{EpochCorruption, EpochManager};
use crate::ledger::leaderboard::{Leaderboard, LeaderboardCorruption};
use crate::ledger::session::SessionRegistry;
use crate::settlement::config::EngineConfig;

/// Structural problems in a loaded state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateCorruption {
    /// A leaderboard is malformed.
    #[error("{board} leaderboard: {source}")]
    Leaderboard {
        /// "human" or "agent".
        board: &'static str,
        /// Problem.
        source: LeaderboardCorruption,
    },
    /// Epoch table is malformed.
    #[error("epochs: {0}")]
    Epochs(#[from] EpochCorruption),
    /// A leaderboard entry's session is not marked consumed.
    #[error("leaderboard session not in registry")]
    UnconsumedSession,
    /// An entry sits on the wrong board.
    #[error("{0} leaderboard holds an entry of the other category")]
    WrongCategory(&'static str),
}

/// Settings changed through the admin capability.
///
/// Persisted with the state so they outrank the boot configuration on
/// restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Trusted score signer.
    pub score_signer: Address,
    /// Treasury recipient.
    pub treasury: Address,
    /// Fee for human submissions.
    pub human_entry_fee: TokenAmount,
    /// Fee for agent submissions.
    pub agent_entry_fee: TokenAmount,
    /// Length of epochs opened from now on.
    pub epoch_duration_secs: u64,
}

impl AdminSettings {
    /// Capture the admin-mutable part of a config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            score_signer: config.score_signer,
            treasury: config.treasury,
            human_entry_fee: config.human_entry_fee,
            agent_entry_fee: config.agent_entry_fee,
            epoch_duration_secs: config.epoch_duration_secs,
        }
    }

    /// Overwrite the matching fields of `config`.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        config.score_signer = self.score_signer;
        config.treasury = self.treasury;
        config.human_entry_fee = self.human_entry_fee;
        config.agent_entry_fee = self.agent_entry_fee;
        config.epoch_duration_secs = self.epoch_duration_secs;
    }
}

/// All engine-owned state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Consumed sessions.
    pub sessions: SessionRegistry,
    /// Human leaderboard.
    pub human_board: Leaderboard,
    /// Agent leaderboard.
    pub agent_board: Leaderboard,
    /// Epoch table.
    pub epochs: EpochManager,
    /// Running total minted to the treasury.
    pub treasury_balance: TokenAmount,
    /// Admin changes, if any were made.
    pub admin_settings: Option<AdminSettings>,
}

impl LedgerState {
    /// Fresh state with epoch 1 opening at `start`.
    pub fn new(start: UnixSeconds, epoch_duration: u64) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            human_board: Leaderboard::new(),
            agent_board: Leaderboard::new(),
            epochs: EpochManager::new(start, epoch_duration),
            treasury_balance: 0,
            admin_settings: None,
        }
    }

    /// Board for a category.
    pub fn board(&self, is_agent: bool) -> &Leaderboard {
        if is_agent {
            &self.agent_board
        } else {
            &self.human_board
        }
    }

    /// Mutable board for a category.
    pub fn board_mut(&mut self, is_agent: bool) -> &mut Leaderboard {
        if is_agent {
            &mut self.agent_board
        } else {
            &mut self.human_board
        }
    }

    /// Check every cross-component invariant.
    pub fn validate(&self) -> Result<(), StateCorruption> {
        for (name, board, is_agent) in [
            ("human", &self.human_board, false),
            ("agent", &self.agent_board, true),
        ] {
            board
                .validate()
                .map_err(|source| StateCorruption::Leaderboard { board: name, source })?;
            if board.iter().any(|e| e.is_agent != is_agent) {
                return Err(StateCorruption::WrongCategory(name));
            }
            if board.iter().any(|e| !self.sessions.is_consumed(&e.session_id)) {
                return Err(StateCorruption::UnconsumedSession);
            }
        }

        self.epochs.validate()?;
        Ok(())
    }
}
