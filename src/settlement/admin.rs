//! Admin Capability
//!
//! Privileged changes go through [`AdminOps`], which only the holder of the
//! engine's [`AdminCapability`] can obtain. The capability is handed out
//! once, at construction, and cannot be cloned.

use tracing::info;
use uuid::Uuid;

use crate::core::{Address, TokenAmount};
use crate::ledger::epoch::EpochManager;
use crate::ledger::error::LedgerError;
use crate::ledger::signature::SignatureVerifier;
use crate::settlement::config::EngineConfig;
use crate::settlement::state::AdminSettings;

/// Proof of admin rights over one engine instance.
#[derive(Debug)]
pub struct AdminCapability {
    engine_id: Uuid,
}

impl AdminCapability {
    pub(crate) fn new(engine_id: Uuid) -> Self {
        Self { engine_id }
    }

    pub(crate) fn grants(&self, engine_id: Uuid) -> bool {
        self.engine_id == engine_id
    }

    /// Engine this capability belongs to.
    pub fn engine_id(&self) -> Uuid {
        self.engine_id
    }
}

/// Privileged operations, borrowed from the engine for one call.
pub struct AdminOps<'a> {
    config: &'a mut EngineConfig,
    verifier: &'a mut SignatureVerifier,
    epochs: &'a mut EpochManager,
    settings: &'a mut Option<AdminSettings>,
}

impl<'a> AdminOps<'a> {
    pub(crate) fn new(
        config: &'a mut EngineConfig,
        verifier: &'a mut SignatureVerifier,
        epochs: &'a mut EpochManager,
        settings: &'a mut Option<AdminSettings>,
    ) -> Self {
        Self { config, verifier, epochs, settings }
    }

    fn record(&mut self) {
        *self.settings = Some(AdminSettings::from_config(self.config));
    }

    /// Rotate the trusted score signer. Takes effect for the next submission.
    pub fn set_score_signer(&mut self, signer: Address) {
        info!("Score signer rotated to {}", signer.short());
        self.config.score_signer = signer;
        *self.verifier = SignatureVerifier::new(signer, self.config.domain_id);
        self.record();
    }

    /// Change the treasury recipient.
    pub fn set_treasury(&mut self, treasury: Address) -> Result<(), LedgerError> {
        if treasury == self.config.vault {
            return Err(LedgerError::InvalidConfig("treasury and vault must differ".into()));
        }
        info!("Treasury set to {}", treasury.short());
        self.config.treasury = treasury;
        self.record();
        Ok(())
    }

    /// Change entry fees. Zero disables the fee for that category.
    pub fn set_entry_fees(&mut self, human: TokenAmount, agent: TokenAmount) {
        info!("Entry fees set: human {}, agent {}", human, agent);
        self.config.human_entry_fee = human;
        self.config.agent_entry_fee = agent;
        self.record();
    }

    /// Change epoch length. The open epoch keeps its end time.
    pub fn set_epoch_duration(&mut self, secs: u64) -> Result<(), LedgerError> {
        if secs == 0 {
            return Err(LedgerError::InvalidConfig("epoch duration must be non-zero".into()));
        }
        info!("Epoch duration set to {}s from the next epoch", secs);
        self.config.epoch_duration_secs = secs;
        self.epochs.set_duration(secs);
        self.record();
        Ok(())
    }
}
