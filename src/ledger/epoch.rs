//! Epoch Lifecycle
//!
//! ```text
//!   Open ──(now ≥ end_time)──▶ Ended ──settle()──▶ Settled
//! ```
//!
//! `Open → Ended` is implicit; nothing is stored when time passes.
//! Exactly one epoch is unsettled at any time: the current one. Settled
//! epochs are read-only history.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::constants::{
    TokenAmount, UnixSeconds, BPS_DENOMINATOR, BURN_BPS, PRIZE_BPS, TREASURY_BPS,
};
use crate::core::Address;
use crate::ledger::error::LedgerError;

// =============================================================================
// FEE SPLIT
// =============================================================================

/// One entry fee divided by basis points.
///
/// Each share truncates; whatever truncation drops is kept in `remainder`
/// so the four parts always sum to the fee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Prize pool share.
    pub prize: TokenAmount,
    /// Burn share.
    pub burn: TokenAmount,
    /// Treasury share.
    pub treasury: TokenAmount,
    /// Truncation dust.
    pub remainder: TokenAmount,
}

impl FeeSplit {
    /// Split a fee.
    pub fn of(amount: TokenAmount) -> Self {
        let prize = amount.saturating_mul(PRIZE_BPS) / BPS_DENOMINATOR;
        let burn = amount.saturating_mul(BURN_BPS) / BPS_DENOMINATOR;
        let treasury = amount.saturating_mul(TREASURY_BPS) / BPS_DENOMINATOR;
        let remainder = amount - prize - burn - treasury;
        Self { prize, burn, treasury, remainder }
    }

    /// Sum of all parts.
    pub fn total(&self) -> TokenAmount {
        self.prize + self.burn + self.treasury + self.remainder
    }
}

// =============================================================================
// EPOCH
// =============================================================================

/// Where an epoch is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochPhase {
    /// Accepting fees, end time not reached.
    Open,
    /// End time reached, waiting for settlement.
    Ended,
    /// Paid out. Read-only.
    Settled,
}

/// One settlement period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    /// Id, starting at 1.
    pub id: u64,
    /// Opened at.
    pub start_time: UnixSeconds,
    /// Settleable from.
    pub end_time: UnixSeconds,
    /// Accumulated prize pool.
    pub prize_pool: TokenAmount,
    /// Accumulated burn amount.
    pub burn_amount: TokenAmount,
    /// Accumulated treasury amount.
    pub treasury_amount: TokenAmount,
    /// Truncation dust from fee splits. Paid to treasury at settlement.
    pub rounding_remainder: TokenAmount,
    /// Sum of fees recorded.
    pub total_fees: TokenAmount,
    /// Submissions whose fee was recorded.
    pub fee_count: u64,
    /// Settled flag.
    pub settled: bool,
    /// Settled at.
    pub settled_at: Option<UnixSeconds>,
    /// Best human so far.
    pub human_winner: Option<Address>,
    /// Best agent so far.
    pub agent_winner: Option<Address>,
    /// Best human score.
    pub human_top_score: u64,
    /// Best agent score.
    pub agent_top_score: u64,
}

impl Epoch {
    /// Fresh epoch.
    pub fn new(id: u64, start_time: UnixSeconds, duration: u64) -> Self {
        Self {
            id,
            start_time,
            end_time: start_time.saturating_add(duration),
            prize_pool: 0,
            burn_amount: 0,
            treasury_amount: 0,
            rounding_remainder: 0,
            total_fees: 0,
            fee_count: 0,
            settled: false,
            settled_at: None,
            human_winner: None,
            agent_winner: None,
            human_top_score: 0,
            agent_top_score: 0,
        }
    }

    /// Phase at a given time.
    pub fn phase(&self, now: UnixSeconds) -> EpochPhase {
        if self.settled {
            EpochPhase::Settled
        } else if now >= self.end_time {
            EpochPhase::Ended
        } else {
            EpochPhase::Open
        }
    }

    /// Seconds left before end, 0 once ended.
    pub fn time_until_end(&self, now: UnixSeconds) -> u64 {
        self.end_time.saturating_sub(now)
    }

    /// Sum of the allocated buckets. Always equals `total_fees`.
    pub fn allocated(&self) -> TokenAmount {
        self.prize_pool + self.burn_amount + self.treasury_amount + self.rounding_remainder
    }

    /// Winner and top score for a category.
    pub fn top(&self, is_agent: bool) -> (Option<Address>, u64) {
        if is_agent {
            (self.agent_winner, self.agent_top_score)
        } else {
            (self.human_winner, self.human_top_score)
        }
    }
}

// =============================================================================
// EPOCH MANAGER
// =============================================================================

/// Problems found when validating a loaded epoch table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EpochCorruption {
    /// Current id missing from table.
    #[error("current epoch {0} missing")]
    MissingCurrent(u64),
    /// Wrong number of unsettled epochs.
    #[error("expected exactly one unsettled epoch, found {0}")]
    UnsettledCount(usize),
    /// Ids not contiguous from 1.
    #[error("epoch ids not contiguous at {0}")]
    Gap(u64),
    /// Bucket sum differs from fees recorded.
    #[error("epoch {0} buckets do not sum to fees")]
    Unbalanced(u64),
}

/// Owns the epoch table and the current epoch pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochManager {
    epochs: BTreeMap<u64, Epoch>,
    current_id: u64,
    duration: u64,
}

impl EpochManager {
    /// Open epoch 1 at `start`.
    pub fn new(start: UnixSeconds, duration: u64) -> Self {
        let mut epochs = BTreeMap::new();
        epochs.insert(1, Epoch::new(1, start, duration));
        Self {
            epochs,
            current_id: 1,
            duration,
        }
    }

    /// Duration used for the next epoch opened.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Change the duration for epochs opened from now on.
    pub fn set_duration(&mut self, duration: u64) {
        self.duration = duration;
    }

    /// Current epoch id.
    pub fn current_id(&self) -> u64 {
        self.current_id
    }

    /// Current (unsettled) epoch.
    pub fn current(&self) -> &Epoch {
        // current_id is always a key: set in new() and settle_and_rotate() only
        &self.epochs[&self.current_id]
    }

    fn current_mut(&mut self) -> &mut Epoch {
        let id = self.current_id;
        match self.epochs.get_mut(&id) {
            Some(epoch) => epoch,
            None => unreachable!("current epoch {} missing from table", id),
        }
    }

    /// Any epoch by id.
    pub fn get(&self, id: u64) -> Option<&Epoch> {
        self.epochs.get(&id)
    }

    /// All epochs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Epoch> {
        self.epochs.values()
    }

    /// Number of epochs ever opened.
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Never true: epoch 1 exists from construction.
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Seconds until the current epoch ends.
    pub fn time_until_end(&self, now: UnixSeconds) -> u64 {
        self.current().time_until_end(now)
    }

    /// Split a fee into the current epoch's buckets.
    pub fn record_fee(&mut self, amount: TokenAmount) -> FeeSplit {
        let split = FeeSplit::of(amount);
        let epoch = self.current_mut();
        epoch.prize_pool += split.prize;
        epoch.burn_amount += split.burn;
        epoch.treasury_amount += split.treasury;
        epoch.rounding_remainder += split.remainder;
        epoch.total_fees += amount;
        epoch.fee_count += 1;
        split
    }

    /// Update the category leader if `score` strictly beats it.
    pub fn record_top_score(&mut self, is_agent: bool, score: u64, player: Address) -> bool {
        let epoch = self.current_mut();
        let (winner, top) = if is_agent {
            (&mut epoch.agent_winner, &mut epoch.agent_top_score)
        } else {
            (&mut epoch.human_winner, &mut epoch.human_top_score)
        };

        if score > *top {
            *top = score;
            *winner = Some(player);
            true
        } else {
            false
        }
    }

    /// Would the given epoch accept `settle` now. Pure.
    pub fn check_settleable(&self, id: u64, now: UnixSeconds) -> Result<&Epoch, LedgerError> {
        let epoch = self.epochs.get(&id).ok_or(LedgerError::UnknownEpoch(id))?;
        match epoch.phase(now) {
            EpochPhase::Settled => Err(LedgerError::AlreadySettled(id)),
            EpochPhase::Open => Err(LedgerError::EpochNotEnded {
                epoch_id: id,
                ends_at: epoch.end_time,
            }),
            EpochPhase::Ended => Ok(epoch),
        }
    }

    /// Settle the current epoch and open the next one.
    ///
    /// Returns the settled epoch and the new current epoch.
    pub fn settle_and_rotate(&mut self, now: UnixSeconds) -> Result<(Epoch, Epoch), LedgerError> {
        self.check_settleable(self.current_id, now)?;

        let settled = {
            let epoch = self.current_mut();
            epoch.settled = true;
            epoch.settled_at = Some(now);
            epoch.clone()
        };

        let next_id = self.current_id + 1;
        let next = Epoch::new(next_id, now, self.duration);
        self.epochs.insert(next_id, next.clone());
        self.current_id = next_id;

        Ok((settled, next))
    }

    /// Check structural invariants. Used after loading from storage.
    pub fn validate(&self) -> Result<(), EpochCorruption> {
        if !self.epochs.contains_key(&self.current_id) {
            return Err(EpochCorruption::MissingCurrent(self.current_id));
        }

        for (expected, id) in (1u64..).zip(self.epochs.keys()) {
            if *id != expected {
                return Err(EpochCorruption::Gap(expected));
            }
        }

        let unsettled: Vec<_> = self.epochs.values().filter(|e| !e.settled).collect();
        if unsettled.len() != 1 || unsettled[0].id != self.current_id {
            return Err(EpochCorruption::UnsettledCount(unsettled.len()));
        }

        if let Some(bad) = self.epochs.values().find(|e| e.allocated() != e.total_fees) {
            return Err(EpochCorruption::Unbalanced(bad.id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAY: u64 = 86_400;

    #[test]
    fn test_fee_split_of_five() {
        let split = FeeSplit::of(5);
        assert_eq!(split.prize, 3);
        assert_eq!(split.burn, 0);
        assert_eq!(split.treasury, 1);
        assert_eq!(split.remainder, 1);
        assert_eq!(split.total(), 5);
    }

    #[test]
    #[should_panic(expected = "current epoch 1 missing")]
    fn test_missing_current_epoch_is_never_recreated() {
        let mut manager = EpochManager::new(0, DAY);
        manager.epochs.clear();
        assert_eq!(manager.validate(), Err(EpochCorruption::MissingCurrent(1)));

        manager.record_fee(10);
    }

    #[test]
    fn test_fee_split_of_ten() {
        let split = FeeSplit::of(10);
        assert_eq!((split.prize, split.burn, split.treasury, split.remainder), (7, 1, 2, 0));
    }

    #[test]
    fn test_first_epoch() {
        let manager = EpochManager::new(0, DAY);
        let epoch = manager.current();
        assert_eq!(epoch.id, 1);
        assert_eq!(epoch.start_time, 0);
        assert_eq!(epoch.end_time, DAY);
        assert!(!epoch.settled);
        assert!(manager.validate().is_ok());
    }

    #[test]
    fn test_phases() {
        let manager = EpochManager::new(100, 50);
        assert_eq!(manager.current().phase(100), EpochPhase::Open);
        assert_eq!(manager.current().phase(149), EpochPhase::Open);
        assert_eq!(manager.current().phase(150), EpochPhase::Ended);
        assert_eq!(manager.time_until_end(120), 30);
        assert_eq!(manager.time_until_end(500), 0);
    }

    #[test]
    fn test_record_fee_accumulates() {
        let mut manager = EpochManager::new(0, DAY);
        manager.record_fee(10);
        manager.record_fee(5);

        let epoch = manager.current();
        assert_eq!(epoch.prize_pool, 10);
        assert_eq!(epoch.burn_amount, 1);
        assert_eq!(epoch.treasury_amount, 3);
        assert_eq!(epoch.rounding_remainder, 1);
        assert_eq!(epoch.total_fees, 15);
        assert_eq!(epoch.fee_count, 2);
        assert_eq!(epoch.allocated(), 15);
    }

    #[test]
    fn test_top_score_strictly_greater() {
        let mut manager = EpochManager::new(0, DAY);
        let a = Address::new([1; 32]);
        let b = Address::new([2; 32]);

        assert!(manager.record_top_score(false, 100, a));
        assert!(!manager.record_top_score(false, 100, b));
        assert_eq!(manager.current().top(false), (Some(a), 100));

        assert!(manager.record_top_score(false, 101, b));
        assert_eq!(manager.current().top(false), (Some(b), 101));

        // Categories are independent
        assert_eq!(manager.current().top(true), (None, 0));
    }

    #[test]
    fn test_zero_score_never_wins() {
        let mut manager = EpochManager::new(0, DAY);
        assert!(!manager.record_top_score(true, 0, Address::new([1; 32])));
        assert_eq!(manager.current().agent_winner, None);
    }

    #[test]
    fn test_settle_before_end_rejected() {
        let mut manager = EpochManager::new(0, DAY);
        let result = manager.settle_and_rotate(DAY - 1);
        assert_eq!(result, Err(LedgerError::EpochNotEnded { epoch_id: 1, ends_at: DAY }));
        assert!(!manager.current().settled);
    }

    #[test]
    fn test_settle_and_rotate() {
        let mut manager = EpochManager::new(0, DAY);
        manager.record_fee(10);

        let (settled, next) = manager.settle_and_rotate(DAY + 1).unwrap();
        assert!(settled.settled);
        assert_eq!(settled.settled_at, Some(DAY + 1));
        assert_eq!(settled.prize_pool, 7);

        assert_eq!(next.id, 2);
        assert_eq!(next.start_time, DAY + 1);
        assert_eq!(next.end_time, 2 * DAY + 1);
        assert_eq!(manager.current_id(), 2);
        assert_eq!(manager.current().prize_pool, 0);
        assert!(manager.validate().is_ok());

        // History is kept
        assert!(manager.get(1).unwrap().settled);
    }

    #[test]
    fn test_settled_epoch_reports_already_settled() {
        let mut manager = EpochManager::new(0, DAY);
        manager.settle_and_rotate(DAY).unwrap();

        assert_eq!(
            manager.check_settleable(1, 10 * DAY).map(|e| e.id),
            Err(LedgerError::AlreadySettled(1))
        );
        assert_eq!(
            manager.check_settleable(9, 10 * DAY).map(|e| e.id),
            Err(LedgerError::UnknownEpoch(9))
        );
    }

    #[test]
    fn test_duration_change_applies_to_next_epoch() {
        let mut manager = EpochManager::new(0, DAY);
        manager.set_duration(3600);
        assert_eq!(manager.current().end_time, DAY);

        let (_, next) = manager.settle_and_rotate(DAY).unwrap();
        assert_eq!(next.end_time, DAY + 3600);
    }

    #[test]
    fn test_validate_detects_unbalanced() {
        let mut manager = EpochManager::new(0, DAY);
        manager.record_fee(10);
        if let Some(epoch) = manager.epochs.get_mut(&1) {
            epoch.prize_pool += 1;
        }
        assert_eq!(manager.validate(), Err(EpochCorruption::Unbalanced(1)));
    }

    proptest! {
        #[test]
        fn prop_fee_split_conserves(fee in 0u128..1_000_000_000_000) {
            let split = FeeSplit::of(fee);
            prop_assert_eq!(split.total(), fee);
            prop_assert!(split.remainder < 3);
            prop_assert_eq!(split.prize, fee * 7_000 / 10_000);
        }

        #[test]
        fn prop_repeated_fees_conserve(fees in proptest::collection::vec(0u128..1_000, 0..50)) {
            let mut manager = EpochManager::new(0, DAY);
            for fee in &fees {
                manager.record_fee(*fee);
            }
            let epoch = manager.current();
            prop_assert_eq!(epoch.allocated(), fees.iter().sum::<u128>());
            prop_assert_eq!(epoch.total_fees, fees.iter().sum::<u128>());
        }
    }
}
