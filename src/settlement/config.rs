//! Engine Configuration
//!
//! Everything the engine needs is passed in here at construction. There is
//! no global state.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::constants::{
    AGENT_ENTRY_FEE, DEFAULT_EPOCH_DURATION_SECS, DEFAULT_MAX_SUPPLY, HUMAN_ENTRY_FEE,
};
use crate::core::{Address, TokenAmount};
use crate::ledger::error::LedgerError;

/// Configuration errors from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Required variable not set.
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    /// Variable could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// What went wrong.
        reason: String,
    },
}

/// Settlement engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Trusted score signer (Ed25519 verifying key).
    pub score_signer: Address,
    /// Receives treasury mints.
    pub treasury: Address,
    /// The engine's own account. Receives entry fees and burn mints.
    pub vault: Address,
    /// Deployment domain bound into every signature.
    pub domain_id: u64,
    /// Length of each epoch.
    pub epoch_duration_secs: u64,
    /// Fee for human submissions.
    pub human_entry_fee: TokenAmount,
    /// Fee for agent submissions.
    pub agent_entry_fee: TokenAmount,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            score_signer: Address::ZERO,
            treasury: Address::from_label("score-ledger-treasury"),
            vault: Address::from_label("score-ledger-vault"),
            domain_id: 1,
            epoch_duration_secs: DEFAULT_EPOCH_DURATION_SECS,
            human_entry_fee: HUMAN_ENTRY_FEE,
            agent_entry_fee: AGENT_ENTRY_FEE,
        }
    }
}

impl EngineConfig {
    /// Entry fee for a category.
    pub fn entry_fee(&self, is_agent: bool) -> TokenAmount {
        if is_agent {
            self.agent_entry_fee
        } else {
            self.human_entry_fee
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.epoch_duration_secs == 0 {
            return Err(LedgerError::InvalidConfig("epoch duration must be non-zero".into()));
        }
        if self.treasury == self.vault {
            return Err(LedgerError::InvalidConfig("treasury and vault must differ".into()));
        }
        Ok(())
    }
}

/// Process-level configuration for the binary.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Engine settings.
    pub engine: EngineConfig,
    /// Cap for the in-memory token.
    pub max_supply: TokenAmount,
    /// Snapshot file. None disables persistence.
    pub state_path: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Read configuration from environment variables.
    ///
    /// `LEDGER_SCORE_SIGNER` and `LEDGER_TREASURY` are required; everything
    /// else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let address = |var: &'static str| -> Result<Option<Address>, ConfigError> {
            lookup(var)
                .map(|v| {
                    Address::from_hex(v.trim()).map_err(|e| ConfigError::Invalid {
                        var,
                        reason: e.to_string(),
                    })
                })
                .transpose()
        };
        let number = |var: &'static str| -> Result<Option<u128>, ConfigError> {
            lookup(var)
                .map(|v| {
                    v.trim().parse::<u128>().map_err(|e| ConfigError::Invalid {
                        var,
                        reason: e.to_string(),
                    })
                })
                .transpose()
        };
        let small = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            number(var)?
                .map(|n| {
                    u64::try_from(n).map_err(|_| ConfigError::Invalid {
                        var,
                        reason: "out of range".into(),
                    })
                })
                .transpose()
        };

        let engine = EngineConfig {
            score_signer: address("LEDGER_SCORE_SIGNER")?
                .ok_or(ConfigError::Missing("LEDGER_SCORE_SIGNER"))?,
            treasury: address("LEDGER_TREASURY")?
                .ok_or(ConfigError::Missing("LEDGER_TREASURY"))?,
            vault: address("LEDGER_VAULT")?.unwrap_or(defaults.vault),
            domain_id: small("LEDGER_DOMAIN_ID")?.unwrap_or(defaults.domain_id),
            epoch_duration_secs: small("LEDGER_EPOCH_DURATION_SECS")?
                .unwrap_or(defaults.epoch_duration_secs),
            human_entry_fee: number("LEDGER_HUMAN_FEE")?.unwrap_or(defaults.human_entry_fee),
            agent_entry_fee: number("LEDGER_AGENT_FEE")?.unwrap_or(defaults.agent_entry_fee),
        };

        if engine.epoch_duration_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "LEDGER_EPOCH_DURATION_SECS",
                reason: "must be non-zero".into(),
            });
        }

        Ok(Self {
            engine,
            max_supply: number("LEDGER_MAX_SUPPLY")?.unwrap_or(DEFAULT_MAX_SUPPLY),
            state_path: lookup("LEDGER_STATE_PATH").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.entry_fee(false), 10);
        assert_eq!(config.entry_fee(true), 5);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = EngineConfig {
            epoch_duration_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_lookup_minimal() {
        let signer = "11".repeat(32);
        let treasury = "22".repeat(32);
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("LEDGER_SCORE_SIGNER", &signer),
            ("LEDGER_TREASURY", &treasury),
        ]))
        .unwrap();

        assert_eq!(config.engine.score_signer, Address::new([0x11; 32]));
        assert_eq!(config.engine.treasury, Address::new([0x22; 32]));
        assert_eq!(config.engine.epoch_duration_secs, DEFAULT_EPOCH_DURATION_SECS);
        assert_eq!(config.max_supply, DEFAULT_MAX_SUPPLY);
        assert!(config.state_path.is_none());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let signer = "11".repeat(32);
        let treasury = "22".repeat(32);
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("LEDGER_SCORE_SIGNER", &signer),
            ("LEDGER_TREASURY", &treasury),
            ("LEDGER_EPOCH_DURATION_SECS", "3600"),
            ("LEDGER_HUMAN_FEE", "20"),
            ("LEDGER_MAX_SUPPLY", "5000"),
            ("LEDGER_STATE_PATH", "/tmp/ledger.bin"),
        ]))
        .unwrap();

        assert_eq!(config.engine.epoch_duration_secs, 3600);
        assert_eq!(config.engine.human_entry_fee, 20);
        assert_eq!(config.engine.agent_entry_fee, AGENT_ENTRY_FEE);
        assert_eq!(config.max_supply, 5000);
        assert_eq!(config.state_path, Some(PathBuf::from("/tmp/ledger.bin")));
    }

    #[test]
    fn test_from_lookup_errors() {
        let missing = RuntimeConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(missing, Err(ConfigError::Missing("LEDGER_SCORE_SIGNER"))));

        let signer = "11".repeat(32);
        let bad = RuntimeConfig::from_lookup(lookup_from(&[
            ("LEDGER_SCORE_SIGNER", &signer),
            ("LEDGER_TREASURY", "nothex"),
        ]));
        assert!(matches!(bad, Err(ConfigError::Invalid { var: "LEDGER_TREASURY", .. })));

        let treasury = "22".repeat(32);
        let zero = RuntimeConfig::from_lookup(lookup_from(&[
            ("LEDGER_SCORE_SIGNER", &signer),
            ("LEDGER_TREASURY", &treasury),
            ("LEDGER_EPOCH_DURATION_SECS", "0"),
        ]));
        assert!(matches!(zero, Err(ConfigError::Invalid { .. })));
    }
}
