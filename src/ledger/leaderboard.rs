//! Bounded Leaderboard
//!
//! Top-N entries ordered by score, highest first.
//!
//! ## Layout
//!
//! ```text
//!   slots  (arena, ≤ N records, never reordered)
//!   ┌────┬────┬────┬────┐
//!   │ A  │ B  │ C  │ D  │
//!   └────┴────┴────┴────┘
//!   order  (arena indices, best first)
//!   [ 2, 0, 3, 1 ]   →   C, A, D, B
//! ```
//!
//! Inserting shifts indices, not records. When full, the slot of the
//! lowest-ranked entry is reused for the newcomer.
//!
//! ## Ties
//!
//! A newcomer only moves ahead of entries it strictly beats, so among equal
//! scores the earliest submission keeps the better rank.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::constants::LEADERBOARD_SIZE;
use crate::core::{Address, SessionId, UnixSeconds};

/// One recorded submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player or agent address.
    pub player: Address,
    /// Score.
    pub score: u64,
    /// Round reached.
    pub round: u64,
    /// Kills.
    pub kills: u64,
    /// Submitted by an agent.
    pub is_agent: bool,
    /// When it was recorded.
    pub timestamp: UnixSeconds,
    /// Session it came from.
    pub session_id: SessionId,
}

impl LeaderboardEntry {
    /// Is this a padding slot.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of an insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// Entry is on the board.
    Inserted {
        /// 1-based rank it landed at.
        rank: usize,
        /// Entry pushed off the bottom, if the board was full.
        evicted: Option<LeaderboardEntry>,
    },
    /// Entry did not make the board.
    Discarded,
}

impl Insertion {
    /// Rank if inserted.
    pub fn rank(&self) -> Option<usize> {
        match self {
            Self::Inserted { rank, .. } => Some(*rank),
            Self::Discarded => None,
        }
    }
}

/// Structural problems found when validating a loaded board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaderboardCorruption {
    /// More entries than capacity.
    #[error("{len} entries exceed capacity {capacity}")]
    Overfull {
        /// Entry count.
        len: usize,
        /// Capacity.
        capacity: usize,
    },
    /// Order list does not index every slot exactly once.
    #[error("order index is not a permutation of slots")]
    BadIndex,
    /// Scores not descending.
    #[error("entries not sorted at rank {0}")]
    Unsorted(usize),
    /// Same session twice.
    #[error("duplicate session {0}")]
    DuplicateSession(SessionId),
}

/// A bounded, score-descending board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    capacity: usize,
    slots: Vec<LeaderboardEntry>,
    order: Vec<usize>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Leaderboard {
    /// Board with the standard capacity.
    pub fn new() -> Self {
        Self::with_capacity(LEADERBOARD_SIZE)
    }

    /// Board with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Maximum entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// No entries yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Board is at capacity.
    pub fn is_full(&self) -> bool {
        self.order.len() >= self.capacity
    }

    /// Entry at a 0-based position.
    pub fn get(&self, position: usize) -> Option<&LeaderboardEntry> {
        self.order.get(position).map(|&slot| &self.slots[slot])
    }

    /// Iterate entries best first.
    pub fn iter(&self) -> impl Iterator<Item = &LeaderboardEntry> {
        self.order.iter().map(move |&slot| &self.slots[slot])
    }

    /// Lowest score on the board.
    pub fn min_score(&self) -> Option<u64> {
        self.order.last().map(|&slot| self.slots[slot].score)
    }

    /// Is this session recorded.
    pub fn contains_session(&self, session_id: &SessionId) -> bool {
        self.slots.iter().any(|e| e.session_id == *session_id)
    }

    /// Would a score make the board. Pure.
    pub fn insertion_point(&self, score: u64) -> Option<usize> {
        match self.order.iter().position(|&slot| score > self.slots[slot].score) {
            Some(position) => Some(position),
            None if !self.is_full() => Some(self.order.len()),
            None => None,
        }
    }

    /// Insert an entry, evicting the last one if full.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Insertion {
        if self.capacity == 0 || self.contains_session(&entry.session_id) {
            return Insertion::Discarded;
        }

        let Some(position) = self.insertion_point(entry.score) else {
            return Insertion::Discarded;
        };

        let evicted = if self.is_full() {
            // Full and insertable means position < len, so a last entry exists
            let Some(victim) = self.order.pop() else {
                return Insertion::Discarded;
            };
            let old = std::mem::replace(&mut self.slots[victim], entry);
            self.order.insert(position, victim);
            Some(old)
        } else {
            self.slots.push(entry);
            self.order.insert(position, self.slots.len() - 1);
            None
        };

        Insertion::Inserted {
            rank: position + 1,
            evicted,
        }
    }

    /// Ordered entries, filled prefix only.
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        self.iter().cloned().collect()
    }

    /// Fixed-length snapshot: `capacity` entries, unfilled slots empty.
    pub fn snapshot(&self) -> Vec<LeaderboardEntry> {
        let mut out = self.entries();
        out.resize(self.capacity, LeaderboardEntry::default());
        out
    }

    /// Check structural invariants. Used after loading from storage.
    pub fn validate(&self) -> Result<(), LeaderboardCorruption> {
        if self.order.len() > self.capacity || self.slots.len() > self.capacity {
            return Err(LeaderboardCorruption::Overfull {
                len: self.order.len().max(self.slots.len()),
                capacity: self.capacity,
            });
        }

        let mut seen = vec![false; self.slots.len()];
        for &slot in &self.order {
            match seen.get_mut(slot) {
                Some(flag) if !*flag => *flag = true,
                _ => return Err(LeaderboardCorruption::BadIndex),
            }
        }
        if seen.iter().any(|s| !s) {
            return Err(LeaderboardCorruption::BadIndex);
        }

        for (rank, pair) in self.order.windows(2).enumerate() {
            if self.slots[pair[0]].score < self.slots[pair[1]].score {
                return Err(LeaderboardCorruption::Unsorted(rank + 1));
            }
        }

        let mut sessions = BTreeSet::new();
        for entry in &self.slots {
            if !sessions.insert(entry.session_id) {
                return Err(LeaderboardCorruption::DuplicateSession(entry.session_id));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(n: u32, score: u64) -> LeaderboardEntry {
        let mut session = [0u8; 32];
        session[..4].copy_from_slice(&n.to_le_bytes());
        LeaderboardEntry {
            player: Address::new([n as u8; 32]),
            score,
            round: 1,
            kills: 0,
            is_agent: false,
            timestamp: n as u64,
            session_id: SessionId::new(session),
        }
    }

    fn scores(board: &Leaderboard) -> Vec<u64> {
        board.iter().map(|e| e.score).collect()
    }

    #[test]
    fn test_insert_orders_descending() {
        let mut board = Leaderboard::new();
        board.insert(entry(1, 50));
        board.insert(entry(2, 100));
        board.insert(entry(3, 75));
        board.insert(entry(4, 10));

        assert_eq!(scores(&board), vec![100, 75, 50, 10]);
    }

    #[test]
    fn test_ranks_are_one_based() {
        let mut board = Leaderboard::new();
        assert_eq!(board.insert(entry(1, 50)).rank(), Some(1));
        assert_eq!(board.insert(entry(2, 100)).rank(), Some(1));
        assert_eq!(board.insert(entry(3, 10)).rank(), Some(3));
    }

    #[test]
    fn test_ties_keep_earlier_entrant_ahead() {
        let mut board = Leaderboard::new();
        board.insert(entry(1, 100));
        let result = board.insert(entry(2, 100));

        assert_eq!(result.rank(), Some(2));
        assert_eq!(board.get(0).unwrap().timestamp, 1);
        assert_eq!(board.get(1).unwrap().timestamp, 2);
    }

    #[test]
    fn test_full_board_discards_non_qualifying() {
        let mut board = Leaderboard::with_capacity(3);
        for (n, s) in [(1, 30), (2, 20), (3, 10)] {
            board.insert(entry(n, s));
        }

        assert_eq!(board.insert(entry(4, 5)), Insertion::Discarded);
        // Equal to the minimum does not displace it
        assert_eq!(board.insert(entry(5, 10)), Insertion::Discarded);
        assert_eq!(scores(&board), vec![30, 20, 10]);
    }

    #[test]
    fn test_eviction_drops_lowest() {
        let mut board = Leaderboard::new();
        for n in 0..LEADERBOARD_SIZE as u32 {
            board.insert(entry(n, 100 + n as u64));
        }
        assert!(board.is_full());
        assert_eq!(board.min_score(), Some(100));

        let result = board.insert(entry(99, 150));
        match result {
            Insertion::Inserted { evicted: Some(old), .. } => {
                assert_eq!(old.score, 100);
                assert_eq!(old.timestamp, 0);
            }
            other => panic!("expected eviction, got {:?}", other),
        }
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert_eq!(board.min_score(), Some(101));
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_duplicate_session_discarded() {
        let mut board = Leaderboard::new();
        board.insert(entry(1, 10));
        let mut dup = entry(1, 500);
        dup.player = Address::new([42; 32]);

        assert_eq!(board.insert(dup), Insertion::Discarded);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_snapshot_is_padded() {
        let mut board = Leaderboard::new();
        board.insert(entry(1, 10));
        board.insert(entry(2, 20));

        let snapshot = board.snapshot();
        assert_eq!(snapshot.len(), LEADERBOARD_SIZE);
        assert_eq!(snapshot[0].score, 20);
        assert_eq!(snapshot[1].score, 10);
        assert!(snapshot[2..].iter().all(LeaderboardEntry::is_empty));
        // Reads never mutate
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_validate_detects_corruption() {
        let mut board = Leaderboard::with_capacity(4);
        board.insert(entry(1, 10));
        board.insert(entry(2, 20));
        assert!(board.validate().is_ok());

        let mut unsorted = board.clone();
        unsorted.order.reverse();
        assert_eq!(unsorted.validate(), Err(LeaderboardCorruption::Unsorted(1)));

        let mut bad_index = board.clone();
        bad_index.order = vec![0, 0];
        assert_eq!(bad_index.validate(), Err(LeaderboardCorruption::BadIndex));
    }

    #[test]
    fn test_zero_capacity_accepts_nothing() {
        let mut board = Leaderboard::with_capacity(0);
        assert_eq!(board.insert(entry(1, 10)), Insertion::Discarded);
    }

    proptest! {
        #[test]
        fn prop_board_stays_sorted_bounded_and_stable(
            raw in proptest::collection::vec(0u64..50, 0..80)
        ) {
            let mut board = Leaderboard::new();
            for (n, score) in raw.iter().enumerate() {
                board.insert(entry(n as u32, *score));

                prop_assert!(board.len() <= LEADERBOARD_SIZE);
                prop_assert!(board.validate().is_ok());

                // Equal scores keep arrival order
                let listed: Vec<_> = board.iter().collect();
                for pair in listed.windows(2) {
                    if pair[0].score == pair[1].score {
                        prop_assert!(pair[0].timestamp < pair[1].timestamp);
                    }
                }
            }

            // Board holds exactly the top entries under the stable ordering
            let mut expected: Vec<(u64, u64)> = raw.iter().enumerate()
                .map(|(n, s)| (*s, n as u64))
                .collect();
            expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            expected.truncate(LEADERBOARD_SIZE);
            let actual: Vec<(u64, u64)> = board.iter().map(|e| (e.score, e.timestamp)).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
