//! Ledger Service
//!
//! Hosts a [`SettlementEngine`] for concurrent callers. All mutations run
//! under one write lock, so submissions and settlements are applied one at a
//! time and reads never observe a half-applied call. Events from each
//! accepted call are broadcast to subscribers in emission order.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, instrument};

use crate::core::{Address, SessionId, TokenAmount};
use crate::external::agents::AgentRegistry;
use crate::external::clock::Clock;
use crate::external::token::TokenLedger;
use crate::ledger::epoch::Epoch;
use crate::ledger::error::LedgerError;
use crate::ledger::events::LedgerEvent;
use crate::ledger::leaderboard::LeaderboardEntry;
use crate::ledger::signature::ScoreSubmission;
use crate::service::store::{LedgerStore, StoreError};
use crate::settlement::admin::{AdminCapability, AdminOps};
use crate::settlement::config::EngineConfig;
use crate::settlement::engine::{SettlementEngine, SettlementReceipt, SubmissionReceipt};
use crate::settlement::state::LedgerState;

/// Event channel depth. Slow subscribers lag rather than block the ledger.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Service failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Engine rejected the call. Nothing changed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The call was applied but the snapshot could not be written.
    #[error("snapshot failed: {0}")]
    Store(#[from] StoreError),
}

/// Shared handle to a hosted ledger.
pub struct LedgerService {
    engine: RwLock<SettlementEngine>,
    store: Option<LedgerStore>,
    events: broadcast::Sender<LedgerEvent>,
}

impl LedgerService {
    /// Host an engine. With a store, every mutation is persisted.
    pub fn new(engine: SettlementEngine, store: Option<LedgerStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine: RwLock::new(engine),
            store,
            events,
        }
    }

    /// Resume from the store's snapshot, or start fresh if there is none.
    pub fn open(
        config: EngineConfig,
        store: Option<LedgerStore>,
        token: Box<dyn TokenLedger>,
        agents: Box<dyn AgentRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, AdminCapability), ServiceError> {
        let snapshot = match &store {
            Some(store) => store.load()?,
            None => None,
        };

        let (engine, admin) = match snapshot {
            Some(snapshot) => {
                info!(
                    "Resuming from snapshot saved at {} (epoch {})",
                    snapshot.saved_at,
                    snapshot.state.epochs.current_id()
                );
                SettlementEngine::restore(config, snapshot.state, token, agents, clock)?
            }
            None => SettlementEngine::new(config, token, agents, clock)?,
        };

        Ok((Self::new(engine, store), admin))
    }

    /// Receive events from calls applied after this point.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Submit a signed score.
    #[instrument(skip(self, submission), fields(session = %submission.session_id.short()))]
    pub async fn submit_score(&self, submission: ScoreSubmission) -> Result<SubmissionReceipt, ServiceError> {
        let mut engine = self.engine.write().await;
        let receipt = engine.submit_score(&submission)?;
        self.publish(&receipt.events);
        self.persist(&engine)?;
        Ok(receipt)
    }

    /// Settle the current epoch.
    #[instrument(skip(self))]
    pub async fn settle_epoch(&self) -> Result<SettlementReceipt, ServiceError> {
        let mut engine = self.engine.write().await;
        let receipt = engine.settle_epoch()?;
        self.publish(&receipt.events);
        self.persist(&engine)?;
        Ok(receipt)
    }

    /// Settle a named epoch.
    #[instrument(skip(self))]
    pub async fn settle_epoch_id(&self, epoch_id: u64) -> Result<SettlementReceipt, ServiceError> {
        let mut engine = self.engine.write().await;
        let receipt = engine.settle_epoch_id(epoch_id)?;
        self.publish(&receipt.events);
        self.persist(&engine)?;
        Ok(receipt)
    }

    /// Run privileged operations under the write lock.
    #[instrument(skip(self, capability, f))]
    pub async fn with_admin<F, R>(&self, capability: &AdminCapability, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut AdminOps<'_>) -> Result<R, LedgerError>,
    {
        let mut engine = self.engine.write().await;
        let result = {
            let mut ops = engine.admin(capability)?;
            f(&mut ops)?
        };
        self.persist(&engine)?;
        Ok(result)
    }

    fn publish(&self, events: &[LedgerEvent]) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event.clone());
        }
    }

    fn persist(&self, engine: &SettlementEngine) -> Result<(), StoreError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.save(engine.state()).map(|_| ()).map_err(|e| {
            error!("Snapshot to {} failed, disk is behind memory: {}", store.path().display(), e);
            e
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Human board, fixed length.
    pub async fn human_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.engine.read().await.human_leaderboard()
    }

    /// Agent board, fixed length.
    pub async fn agent_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.engine.read().await.agent_leaderboard()
    }

    /// Filled entries of a board.
    pub async fn leaderboard_entries(&self, is_agent: bool) -> Vec<LeaderboardEntry> {
        self.engine.read().await.leaderboard_entries(is_agent)
    }

    /// Current epoch.
    pub async fn current_epoch(&self) -> Epoch {
        self.engine.read().await.current_epoch().clone()
    }

    /// Any epoch.
    pub async fn epoch(&self, id: u64) -> Option<Epoch> {
        self.engine.read().await.epoch(id).cloned()
    }

    /// Seconds until the current epoch can be settled.
    pub async fn time_until_epoch_end(&self) -> u64 {
        self.engine.read().await.time_until_epoch_end()
    }

    /// Has a session been consumed.
    pub async fn is_session_consumed(&self, session_id: SessionId) -> bool {
        self.engine.read().await.is_session_consumed(&session_id)
    }

    /// Total minted to the treasury.
    pub async fn treasury_balance(&self) -> TokenAmount {
        self.engine.read().await.treasury_balance()
    }

    /// Token balance of an account.
    pub async fn balance_of(&self, account: Address) -> TokenAmount {
        self.engine.read().await.token().balance_of(&account)
    }

    /// Consistent copy of the whole state.
    pub async fn state(&self) -> LedgerState {
        self.engine.read().await.state().clone()
    }
}
