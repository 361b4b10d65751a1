//! Settlement
//!
//! The engine that ties the ledger components to the external collaborators,
//! plus its configuration and admin surface.

pub mod admin;
pub mod config;
pub mod engine;
pub mod state;

pub use admin::{AdminCapability, AdminOps};
pub use config::{ConfigError, EngineConfig, RuntimeConfig};
pub use engine::{SettlementEngine, SettlementReceipt, SubmissionReceipt};
pub use state::{LedgerState, StateCorruption};
