//! Agent Registry Interface
//!
//! The engine reads "is this address an agent" and writes "a game was
//! completed". Registration itself happens elsewhere.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::Address;

/// Stats kept per address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Registered as an automated agent.
    pub is_agent: bool,
    /// Completed games.
    pub games_played: u64,
    /// Sum of scores.
    pub total_score: u64,
    /// Best score.
    pub best_score: u64,
}

/// What the engine may do with the agent registry.
pub trait AgentRegistry: Send + Sync {
    /// Profile for an address. Unknown addresses are humans with no games.
    fn profile(&self, player: &Address) -> AgentProfile;

    /// Count one completed game.
    fn record_game(&mut self, player: &Address, score: u64);
}

/// In-process registry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryAgentRegistry {
    profiles: BTreeMap<Address, AgentProfile>,
}

impl InMemoryAgentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an address as an agent.
    pub fn register_agent(&mut self, agent: Address) {
        self.profiles.entry(agent).or_default().is_agent = true;
    }
}

impl AgentRegistry for InMemoryAgentRegistry {
    fn profile(&self, player: &Address) -> AgentProfile {
        self.profiles.get(player).copied().unwrap_or_default()
    }

    fn record_game(&mut self, player: &Address, score: u64) {
        let profile = self.profiles.entry(*player).or_default();
        profile.games_played += 1;
        profile.total_score = profile.total_score.saturating_add(score);
        profile.best_score = profile.best_score.max(score);
    }
}
