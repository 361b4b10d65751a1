//! Durable Snapshot Store
//!
//! ```text
//! ┌─────────┬──────────────────────────────────────────┐
//! │ version │ bincode(LedgerSnapshot)                  │
//! │ 1 byte  │ saved_at, sessions, boards, epochs, ...  │
//! └─────────┴──────────────────────────────────────────┘
//! ```
//!
//! Writes go to `<path>.tmp`, are fsynced, then renamed over `<path>`, so a
//! crash leaves either the old snapshot or the new one on disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::settlement::state::{LedgerState, StateCorruption};

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 2;

/// Store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// Snapshot could not be encoded.
    #[error("encode: {0}")]
    Encode(String),
    /// Snapshot written by an incompatible version.
    #[error("snapshot version {found}, expected {expected}")]
    Version {
        /// Supported version.
        expected: u8,
        /// Version on disk.
        found: u8,
    },
    /// Snapshot bytes or contents are malformed.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}

impl From<StateCorruption> for StoreError {
    fn from(err: StateCorruption) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Persisted engine state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Engine state.
    pub state: LedgerState,
}

impl LedgerSnapshot {
    /// Snapshot of `state` taken now.
    pub fn new(state: LedgerState) -> Self {
        Self {
            saved_at: Utc::now(),
            state,
        }
    }

    /// Encode with the version prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let body = bincode::serialize(self).map_err(|e| StoreError::Encode(e.to_string()))?;
        let mut bytes = Vec::with_capacity(body.len() + 1);
        bytes.push(SNAPSHOT_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode and validate.
    pub fn from_bytes(data: &[u8]) -> Result<Self, StoreError> {
        let (&version, body) = data
            .split_first()
            .ok_or_else(|| StoreError::Corrupt("empty file".into()))?;
        if version != SNAPSHOT_VERSION {
            return Err(StoreError::Version {
                expected: SNAPSHOT_VERSION,
                found: version,
            });
        }

        let snapshot: Self =
            bincode::deserialize(body).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        snapshot.state.validate()?;
        Ok(snapshot)
    }
}

/// Snapshot file on local disk.
#[derive(Clone, Debug)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Store at `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Load the last snapshot. `None` if none was ever saved.
    pub fn load(&self) -> Result<Option<LedgerSnapshot>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = LedgerSnapshot::from_bytes(&data)?;
        debug!("Loaded snapshot from {} (saved {})", self.path.display(), snapshot.saved_at);
        Ok(Some(snapshot))
    }

    /// Replace the snapshot on disk.
    pub fn save(&self, state: &LedgerState) -> Result<LedgerSnapshot, StoreError> {
        let snapshot = LedgerSnapshot::new(state.clone());
        let bytes = snapshot.to_bytes()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} byte snapshot to {}", bytes.len(), self.path.display());
        Ok(snapshot)
    }
}
