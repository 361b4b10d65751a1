//! Core deterministic primitives.
//!
//! Nothing in this module touches clocks, I/O or randomness.

pub mod address;
pub mod constants;
pub mod hash;

// Re-export core types
pub use address::{Address, SessionId, IdParseError};
pub use constants::{TokenAmount, UnixSeconds};
pub use hash::{Hash32, PayloadHasher, hash_with_domain};
