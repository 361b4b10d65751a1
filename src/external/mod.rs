//! External Collaborators
//!
//! Narrow interfaces to the token, the agent registry and the clock.
//! The engine holds these as capabilities and can do nothing else with them.

pub mod agents;
pub mod clock;
pub mod token;

pub use agents::{AgentProfile, AgentRegistry, InMemoryAgentRegistry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{InMemoryTokenLedger, TokenError, TokenLedger};
