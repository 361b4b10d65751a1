//! Gameplay Rewards
//!
//! `reward = kills * REWARD_PER_KILL + round * REWARD_PER_ROUND + milestones`

use crate::core::constants::{
    TokenAmount, MILESTONE_BONUSES, REWARD_PER_KILL, REWARD_PER_ROUND,
};

/// Sum of every milestone bonus the round has reached.
pub fn milestone_bonus(round: u64) -> TokenAmount {
    MILESTONE_BONUSES
        .iter()
        .filter(|(threshold, _)| round >= *threshold)
        .fold(0, |acc: TokenAmount, (_, bonus)| acc.saturating_add(*bonus))
}

/// Reward minted for one completed game. Saturates, never wraps.
pub fn gameplay_reward(kills: u64, round: u64) -> TokenAmount {
    (kills as TokenAmount)
        .saturating_mul(REWARD_PER_KILL)
        .saturating_add((round as TokenAmount).saturating_mul(REWARD_PER_ROUND))
        .saturating_add(milestone_bonus(round))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_activity_no_reward() {
        assert_eq!(gameplay_reward(0, 0), 0);
    }

    #[test]
    fn test_linear_terms() {
        assert_eq!(gameplay_reward(3, 0), 3 * REWARD_PER_KILL);
        assert_eq!(gameplay_reward(0, 4), 4 * REWARD_PER_ROUND);
    }

    #[test]
    fn test_milestones_are_cumulative() {
        assert_eq!(milestone_bonus(4), 0);
        assert_eq!(milestone_bonus(5), 50);
        assert_eq!(milestone_bonus(9), 50);
        assert_eq!(milestone_bonus(10), 50 + 150);
        assert_eq!(milestone_bonus(20), 50 + 150 + 500);
        assert_eq!(milestone_bonus(1_000), 50 + 150 + 500);
    }

    #[test]
    fn test_full_formula() {
        // 2 kills, round 10: 20 + 50 + 50 + 150
        assert_eq!(gameplay_reward(2, 10), 270);
    }

    #[test]
    fn test_extreme_inputs_do_not_wrap() {
        let max = gameplay_reward(u64::MAX, u64::MAX);
        assert!(max > gameplay_reward(u64::MAX - 1, u64::MAX));
    }
}
