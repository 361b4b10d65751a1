//! Settlement Engine
//!
//! Composes verifier, session registry, leaderboards, epochs and rewards
//! into the two mutating calls: [`SettlementEngine::submit_score`] and
//! [`SettlementEngine::settle_epoch`].
//!
//! ## Atomicity
//!
//! Each call checks everything that can fail before its first irreversible
//! step. A submission's only fallible mutation is the reward mint, so it
//! runs first; a settlement simulates its whole mint plan against the
//! supply cap before minting anything. On error nothing has changed.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::{Address, SessionId, TokenAmount, UnixSeconds};
use crate::external::agents::AgentRegistry;
use crate::external::clock::Clock;
use crate::external::token::TokenLedger;
use crate::ledger::epoch::{Epoch, FeeSplit};
use crate::ledger::error::LedgerError;
use crate::ledger::events::{LedgerEvent, MintReason};
use crate::ledger::leaderboard::{Insertion, Leaderboard, LeaderboardEntry};
use crate::ledger::reward::gameplay_reward;
use crate::ledger::signature::{ScoreSubmission, SignatureVerifier};
use crate::settlement::admin::{AdminCapability, AdminOps};
use crate::settlement::config::EngineConfig;
use crate::settlement::state::LedgerState;

/// Result of an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Epoch the submission counted towards.
    pub epoch_id: u64,
    /// Submitter is an agent.
    pub is_agent: bool,
    /// Gameplay reward minted.
    pub reward: TokenAmount,
    /// Fee split, if the fee was charged.
    pub fee: Option<FeeSplit>,
    /// Leaderboard outcome.
    pub insertion: Insertion,
    /// Became the epoch's category leader.
    pub new_epoch_leader: bool,
    /// Events in emission order.
    pub events: Vec<LedgerEvent>,
}

/// Result of a settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// The epoch as settled.
    pub settled: Epoch,
    /// Human prize minted.
    pub human_prize: TokenAmount,
    /// Agent prize minted.
    pub agent_prize: TokenAmount,
    /// Amount minted and burned.
    pub burned: TokenAmount,
    /// Amount minted to the treasury.
    pub treasury: TokenAmount,
    /// The newly opened epoch.
    pub next: Epoch,
    /// Events in emission order.
    pub events: Vec<LedgerEvent>,
}

/// Prize distribution for one epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Payout {
    human: Option<(Address, TokenAmount)>,
    agent: Option<(Address, TokenAmount)>,
    burn: TokenAmount,
    treasury: TokenAmount,
}

impl Payout {
    /// Split the pool between category winners.
    ///
    /// Both present: human gets the floor half, agent the rest.
    /// One present: that winner gets the whole pool in a single mint.
    /// None: nothing is paid and the pool stays on record.
    fn plan(epoch: &Epoch) -> Self {
        let pool = epoch.prize_pool;
        let human_half = pool / 2;
        let agent_half = pool - human_half;

        let (human, agent) = match (epoch.human_winner, epoch.agent_winner) {
            (Some(h), Some(a)) => (Some((h, human_half)), Some((a, agent_half))),
            (Some(h), None) => (Some((h, pool)), None),
            (None, Some(a)) => (None, Some((a, pool))),
            (None, None) => (None, None),
        };

        Self {
            human,
            agent,
            burn: epoch.burn_amount,
            treasury: epoch.treasury_amount + epoch.rounding_remainder,
        }
    }

    fn human_prize(&self) -> TokenAmount {
        self.human.map(|(_, amount)| amount).unwrap_or(0)
    }

    fn agent_prize(&self) -> TokenAmount {
        self.agent.map(|(_, amount)| amount).unwrap_or(0)
    }

    /// Replay the mint/burn sequence against the supply cap.
    fn check_supply(&self, supply: TokenAmount, max: TokenAmount) -> Result<(), LedgerError> {
        let mut supply = supply;
        let mint = |amount: TokenAmount, supply: &mut TokenAmount| {
            let available = max.saturating_sub(*supply);
            if amount > available {
                return Err(LedgerError::SupplyExceeded { requested: amount, available });
            }
            *supply += amount;
            Ok(())
        };

        mint(self.human_prize(), &mut supply)?;
        mint(self.agent_prize(), &mut supply)?;
        mint(self.burn, &mut supply)?;
        supply -= self.burn;
        mint(self.treasury, &mut supply)?;
        Ok(())
    }
}

/// The score ledger and epoch settlement engine.
pub struct SettlementEngine {
    id: Uuid,
    config: EngineConfig,
    verifier: SignatureVerifier,
    state: LedgerState,
    token: Box<dyn TokenLedger>,
    agents: Box<dyn AgentRegistry>,
    clock: Arc<dyn Clock>,
}

impl SettlementEngine {
    /// Create an engine with epoch 1 opening now.
    ///
    /// Returns the admin capability for this instance alongside it.
    pub fn new(
        config: EngineConfig,
        token: Box<dyn TokenLedger>,
        agents: Box<dyn AgentRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, AdminCapability), LedgerError> {
        let state = LedgerState::new(clock.now(), config.epoch_duration_secs);
        Self::restore(config, state, token, agents, clock)
    }

    /// Create an engine over previously persisted state.
    ///
    /// Settings recorded through the admin capability override `config`.
    pub fn restore(
        mut config: EngineConfig,
        mut state: LedgerState,
        token: Box<dyn TokenLedger>,
        agents: Box<dyn AgentRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, AdminCapability), LedgerError> {
        if let Some(settings) = &state.admin_settings {
            info!("Applying persisted admin settings (signer {})", settings.score_signer.short());
            settings.apply_to(&mut config);
        }
        config.validate()?;
        state
            .validate()
            .map_err(|e| LedgerError::InvalidConfig(format!("corrupt state: {}", e)))?;
        state.epochs.set_duration(config.epoch_duration_secs);

        let id = Uuid::new_v4();
        let engine = Self {
            id,
            verifier: SignatureVerifier::new(config.score_signer, config.domain_id),
            config,
            state,
            token,
            agents,
            clock,
        };

        let epoch = engine.state.epochs.current();
        info!(
            "Engine {} ready: epoch {} ends at {}, {} sessions consumed",
            id, epoch.id, epoch.end_time, engine.state.sessions.len()
        );

        Ok((engine, AdminCapability::new(id)))
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Accept one signed score report.
    pub fn submit_score(&mut self, submission: &ScoreSubmission) -> Result<SubmissionReceipt, LedgerError> {
        let result = self.apply_submission(submission);
        match &result {
            Ok(receipt) => info!(
                "Score accepted: player {} score {} epoch {} rank {:?}",
                submission.submitter.short(),
                submission.score,
                receipt.epoch_id,
                receipt.insertion.rank()
            ),
            Err(e) => warn!(
                "Score rejected ({}): player {} session {}",
                e.kind(),
                submission.submitter.short(),
                submission.session_id.short()
            ),
        }
        result
    }

    fn apply_submission(&mut self, submission: &ScoreSubmission) -> Result<SubmissionReceipt, LedgerError> {
        let now = self.clock.now();
        let player = submission.submitter;

        // Checks. Nothing below this block may fail before the mint.
        self.verifier.verify(submission, now)?;
        if self.state.sessions.is_consumed(&submission.session_id) {
            return Err(LedgerError::ReplayedSession(submission.session_id));
        }
        let is_agent = self.agents.profile(&player).is_agent;
        let fee_amount = self.config.entry_fee(is_agent);
        // Decided on pre-reward balances, so the reward never funds the fee
        let fee_payable = self.fee_payable(&player, fee_amount);
        let reward = gameplay_reward(submission.kills, submission.round);

        if reward > 0 {
            self.token.mint(&player, reward)?;
        }

        // Commit.
        let consumed = self.state.sessions.try_consume(submission.session_id);
        debug_assert!(consumed, "session checked unconsumed above");

        let epoch_id = self.state.epochs.current_id();
        let mut events = Vec::new();

        let fee = if fee_payable {
            self.charge_entry_fee(&player, fee_amount, epoch_id, &mut events)
        } else {
            None
        };

        self.agents.record_game(&player, submission.score);

        if reward > 0 {
            events.push(LedgerEvent::RewardMinted {
                player,
                amount: reward,
                reason: MintReason::Gameplay,
            });
        }

        let insertion = self.state.board_mut(is_agent).insert(LeaderboardEntry {
            player,
            score: submission.score,
            round: submission.round,
            kills: submission.kills,
            is_agent,
            timestamp: now,
            session_id: submission.session_id,
        });
        if let Insertion::Inserted { rank, evicted } = &insertion {
            if let Some(old) = evicted {
                debug!("Evicted {} (score {}) from {} board", old.player.short(), old.score, category(is_agent));
            }
            events.push(LedgerEvent::LeaderboardUpdated {
                is_agent,
                rank: *rank,
                player,
                score: submission.score,
            });
        }

        let new_epoch_leader = self.state.epochs.record_top_score(is_agent, submission.score, player);

        events.push(LedgerEvent::ScoreSubmitted {
            player,
            score: submission.score,
            round: submission.round,
            kills: submission.kills,
            is_agent,
            epoch_id,
            session_id: submission.session_id,
        });

        Ok(SubmissionReceipt {
            epoch_id,
            is_agent,
            reward,
            fee,
            insertion,
            new_epoch_leader,
            events,
        })
    }

    /// Can the fee be collected. Shortfalls are not errors.
    fn fee_payable(&self, player: &Address, amount: TokenAmount) -> bool {
        if amount == 0 {
            return false;
        }
        let allowance = self.token.allowance(player, &self.config.vault);
        if allowance < amount {
            debug!("Fee skipped for {}: allowance {} < {}", player.short(), allowance, amount);
            return false;
        }
        let balance = self.token.balance_of(player);
        if balance < amount {
            debug!("Fee skipped for {}: balance {} < {}", player.short(), balance, amount);
            return false;
        }
        true
    }

    fn charge_entry_fee(
        &mut self,
        player: &Address,
        amount: TokenAmount,
        epoch_id: u64,
        events: &mut Vec<LedgerEvent>,
    ) -> Option<FeeSplit> {
        let vault = self.config.vault;
        if let Err(e) = self.token.transfer_from(&vault, player, &vault, amount) {
            warn!("Fee transfer for {} failed after check, skipping: {}", player.short(), e);
            return None;
        }

        let split = self.state.epochs.record_fee(amount);
        events.push(LedgerEvent::FeeCollected {
            player: *player,
            amount,
            epoch_id,
        });
        Some(split)
    }

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    /// Settle the current epoch and open the next.
    pub fn settle_epoch(&mut self) -> Result<SettlementReceipt, LedgerError> {
        let id = self.state.epochs.current_id();
        self.settle_epoch_id(id)
    }

    /// Settle a named epoch. A settled one yields `AlreadySettled`.
    pub fn settle_epoch_id(&mut self, epoch_id: u64) -> Result<SettlementReceipt, LedgerError> {
        let result = self.apply_settlement(epoch_id);
        match &result {
            Ok(receipt) => info!(
                "Epoch {} settled: human {:?} +{}, agent {:?} +{}, burned {}, treasury {}",
                receipt.settled.id,
                receipt.settled.human_winner,
                receipt.human_prize,
                receipt.settled.agent_winner,
                receipt.agent_prize,
                receipt.burned,
                receipt.treasury
            ),
            Err(e) => warn!("Settlement of epoch {} rejected: {}", epoch_id, e),
        }
        result
    }

    fn apply_settlement(&mut self, epoch_id: u64) -> Result<SettlementReceipt, LedgerError> {
        let now = self.clock.now();

        // Checks.
        let payout = Payout::plan(self.state.epochs.check_settleable(epoch_id, now)?);
        payout.check_supply(self.token.total_supply(), self.token.max_supply())?;

        // Commit.
        let mut events = Vec::new();

        if let Some((winner, prize)) = payout.human {
            if prize > 0 {
                self.token.mint(&winner, prize)?;
                events.push(LedgerEvent::RewardMinted {
                    player: winner,
                    amount: prize,
                    reason: MintReason::HumanPrize,
                });
            }
        }
        if let Some((winner, prize)) = payout.agent {
            if prize > 0 {
                self.token.mint(&winner, prize)?;
                events.push(LedgerEvent::RewardMinted {
                    player: winner,
                    amount: prize,
                    reason: MintReason::AgentPrize,
                });
            }
        }

        if payout.burn > 0 {
            let vault = self.config.vault;
            self.token.mint(&vault, payout.burn)?;
            self.token.burn(&vault, payout.burn)?;
            events.push(LedgerEvent::TokensBurned {
                epoch_id,
                amount: payout.burn,
            });
        }

        if payout.treasury > 0 {
            let treasury = self.config.treasury;
            self.token.mint(&treasury, payout.treasury)?;
            self.state.treasury_balance += payout.treasury;
            events.push(LedgerEvent::RewardMinted {
                player: treasury,
                amount: payout.treasury,
                reason: MintReason::Treasury,
            });
        }

        let (settled, next) = self.state.epochs.settle_and_rotate(now)?;

        events.push(LedgerEvent::EpochSettled {
            epoch_id: settled.id,
            human_winner: settled.human_winner,
            human_prize: payout.human_prize(),
            agent_winner: settled.agent_winner,
            agent_prize: payout.agent_prize(),
            burned: payout.burn,
            treasury: payout.treasury,
        });
        events.push(LedgerEvent::EpochStarted {
            epoch_id: next.id,
            start_time: next.start_time,
            end_time: next.end_time,
        });

        Ok(SettlementReceipt {
            human_prize: payout.human_prize(),
            agent_prize: payout.agent_prize(),
            burned: payout.burn,
            treasury: payout.treasury,
            settled,
            next,
            events,
        })
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    /// Privileged operations, gated on this engine's capability.
    pub fn admin(&mut self, capability: &AdminCapability) -> Result<AdminOps<'_>, LedgerError> {
        if !capability.grants(self.id) {
            warn!("Admin access denied on engine {}", self.id);
            return Err(LedgerError::Unauthorized);
        }
        Ok(AdminOps::new(
            &mut self.config,
            &mut self.verifier,
            &mut self.state.epochs,
            &mut self.state.admin_settings,
        ))
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Instance id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Durable state.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Token collaborator, read-only.
    pub fn token(&self) -> &dyn TokenLedger {
        self.token.as_ref()
    }

    /// Agent registry, read-only.
    pub fn agents(&self) -> &dyn AgentRegistry {
        self.agents.as_ref()
    }

    /// Current time per the engine's clock.
    pub fn now(&self) -> UnixSeconds {
        self.clock.now()
    }

    /// Board for a category.
    pub fn leaderboard(&self, is_agent: bool) -> &Leaderboard {
        self.state.board(is_agent)
    }

    /// Human board, fixed length, unfilled slots empty.
    pub fn human_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.state.human_board.snapshot()
    }

    /// Agent board, fixed length, unfilled slots empty.
    pub fn agent_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.state.agent_board.snapshot()
    }

    /// Filled entries of a board, best first.
    pub fn leaderboard_entries(&self, is_agent: bool) -> Vec<LeaderboardEntry> {
        self.state.board(is_agent).entries()
    }

    /// Current epoch.
    pub fn current_epoch(&self) -> &Epoch {
        self.state.epochs.current()
    }

    /// Any epoch.
    pub fn epoch(&self, id: u64) -> Option<&Epoch> {
        self.state.epochs.get(id)
    }

    /// Seconds until the current epoch can be settled.
    pub fn time_until_epoch_end(&self) -> u64 {
        self.state.epochs.time_until_end(self.clock.now())
    }

    /// Has a session been consumed.
    pub fn is_session_consumed(&self, session_id: &SessionId) -> bool {
        self.state.sessions.is_consumed(session_id)
    }

    /// Total minted to the treasury so far.
    pub fn treasury_balance(&self) -> TokenAmount {
        self.state.treasury_balance
    }
}

fn category(is_agent: bool) -> &'static str {
    if is_agent { "agent" } else { "human" }
}
