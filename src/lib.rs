//! # Score Ledger
//!
//! Accepts signed score reports, keeps per-category leaderboards, collects
//! entry fees into time-boxed epochs and settles each epoch by minting
//! prizes, burning and funding the treasury.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SCORE LEDGER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── address.rs  - Address and SessionId identifiers         │
//! │  ├── constants.rs- Fees, splits, rewards, limits             │
//! │  └── hash.rs     - Domain-separated SHA-256                  │
//! │                                                              │
//! │  ledger/         - State machines (clock-free)               │
//! │  ├── signature.rs- Ed25519 score verification                │
//! │  ├── session.rs  - Replay protection                         │
//! │  ├── leaderboard.rs - Bounded top-N boards                   │
//! │  ├── epoch.rs    - Fee buckets and epoch rotation            │
//! │  ├── reward.rs   - Gameplay rewards                          │
//! │  └── events.rs   - Notifications                             │
//! │                                                              │
//! │  external/       - Token, agent registry, clock              │
//! │                                                              │
//! │  settlement/     - Engine, config, admin capability          │
//! │                                                              │
//! │  service/        - Async hosting and durable snapshots       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Every session id is accepted at most once, ever.
//! - A failed call changes nothing: no tokens move, no state updates.
//! - Fee splits always sum to the fee collected.
//! - Given the same inputs and times, the ledger reaches the same state
//!   (BTreeMap/BTreeSet everywhere, time passed in explicitly).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod external;
pub mod ledger;
pub mod service;
pub mod settlement;

// Re-export commonly used types
pub use core::{Address, SessionId, TokenAmount, UnixSeconds};
pub use external::{Clock, InMemoryAgentRegistry, InMemoryTokenLedger, ManualClock, SystemClock};
pub use ledger::{LedgerError, LedgerEvent, LeaderboardEntry, ScoreSigner, ScoreSubmission};
pub use service::{LedgerService, LedgerStore, ServiceError};
pub use settlement::{AdminCapability, EngineConfig, RuntimeConfig, SettlementEngine};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
