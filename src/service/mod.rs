//! Hosting
//!
//! Serialized async access to one engine, event fan-out and durable
//! snapshots.

pub mod handle;
pub mod store;

pub use handle::{LedgerService, ServiceError};
pub use store::{LedgerSnapshot, LedgerStore, StoreError, SNAPSHOT_VERSION};
