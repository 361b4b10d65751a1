//! Economic Constants
//!
//! Every amount is in raw token units. All arithmetic on these values is
//! integer-only; percentages are expressed in basis points.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Entry fee split (basis points of 10_000)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PRIZE     7000  →  epoch prize pool (human/agent winners)  │
//! │  BURN      1000  →  minted to vault, burned at settlement   │
//! │  TREASURY  2000  →  minted to treasury at settlement        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Token amount in raw units.
pub type TokenAmount = u128;

/// Unix timestamp in seconds.
pub type UnixSeconds = u64;

// =============================================================================
// SIGNATURES
// =============================================================================

/// A signed score is accepted until `signed_at + FRESHNESS_WINDOW_SECS`.
pub const FRESHNESS_WINDOW_SECS: u64 = 300;

// =============================================================================
// FEES
// =============================================================================

/// Basis point denominator.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Share of each entry fee going to the prize pool.
pub const PRIZE_BPS: u128 = 7_000;

/// Share of each entry fee scheduled for burning.
pub const BURN_BPS: u128 = 1_000;

/// Share of each entry fee going to the treasury.
pub const TREASURY_BPS: u128 = 2_000;

/// Entry fee charged to human players.
pub const HUMAN_ENTRY_FEE: TokenAmount = 10;

/// Entry fee charged to agents (half the human fee).
pub const AGENT_ENTRY_FEE: TokenAmount = 5;

// =============================================================================
// REWARDS
// =============================================================================

/// Gameplay reward per kill.
pub const REWARD_PER_KILL: TokenAmount = 10;

/// Gameplay reward per round survived.
pub const REWARD_PER_ROUND: TokenAmount = 5;

/// Round milestones and their bonuses. Every reached milestone pays.
pub const MILESTONE_BONUSES: [(u64, TokenAmount); 3] = [
    (5, 50),
    (10, 150),
    (20, 500),
];

// =============================================================================
// SUPPLY / EPOCHS / BOARDS
// =============================================================================

/// Default hard cap on token supply.
pub const DEFAULT_MAX_SUPPLY: TokenAmount = 1_000_000_000;

/// Default epoch length: one day.
pub const DEFAULT_EPOCH_DURATION_SECS: u64 = 86_400;

/// Entries kept per leaderboard.
pub const LEADERBOARD_SIZE: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_covers_whole_fee() {
        assert_eq!(PRIZE_BPS + BURN_BPS + TREASURY_BPS, BPS_DENOMINATOR);
    }

    #[test]
    fn test_agents_pay_half() {
        assert_eq!(AGENT_ENTRY_FEE * 2, HUMAN_ENTRY_FEE);
    }

    #[test]
    fn test_milestones_ascending() {
        for pair in MILESTONE_BONUSES.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }
}
