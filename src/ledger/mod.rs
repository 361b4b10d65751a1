//! Score Ledger State Machines
//!
//! Pure, clock-free components. Every function takes `now` explicitly
//! where time matters, so the same inputs always give the same state.

pub mod epoch;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod reward;
pub mod session;
pub mod signature;

pub use epoch::{Epoch, EpochManager, EpochPhase, FeeSplit};
pub use error::LedgerError;
pub use events::{LedgerEvent, MintReason};
pub use leaderboard::{Insertion, Leaderboard, LeaderboardEntry};
pub use reward::gameplay_reward;
pub use session::SessionRegistry;
pub use signature::{ScoreSigner, ScoreSubmission, SignatureVerifier};
