//! Session Replay Protection
//!
//! The set of consumed session ids. It only grows.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::SessionId;

/// Consumed sessions.
///
/// BTreeSet keeps snapshots byte-identical for identical histories.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRegistry {
    consumed: BTreeSet<SessionId>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and mark in one step. Returns false if already consumed.
    pub fn try_consume(&mut self, session_id: SessionId) -> bool {
        self.consumed.insert(session_id)
    }

    /// Has this session been consumed.
    pub fn is_consumed(&self, session_id: &SessionId) -> bool {
        self.consumed.contains(session_id)
    }

    /// Number of consumed sessions.
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    /// No sessions consumed yet.
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }

    /// Iterate consumed sessions in order.
    pub fn iter(&self) -> impl Iterator<Item = &SessionId> {
        self.consumed.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_once() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::new([1; 32]);

        assert!(!registry.is_consumed(&id));
        assert!(registry.try_consume(id));
        assert!(registry.is_consumed(&id));
        assert!(!registry.try_consume(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_independent_sessions() {
        let mut registry = SessionRegistry::new();
        for i in 0..10u8 {
            assert!(registry.try_consume(SessionId::new([i; 32])));
        }
        assert_eq!(registry.len(), 10);
        assert!(registry.iter().zip(registry.iter().skip(1)).all(|(a, b)| a < b));
    }
}
