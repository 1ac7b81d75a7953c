//! Persistence of the round pointer and round snapshots.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{PointerUpdate, Round, RoundPointer};

/// Storage for the single round pointer document.
#[async_trait]
pub trait PointerStore: Send + Sync {
    /// The stored pointer, or `None` before the first round was discovered.
    async fn get(&self) -> Result<Option<RoundPointer>>;

    /// Replace the pointer with a fresh one tracking `round_id`.
    async fn set(&self, document_path: &str, round_id: &str, now: DateTime<Utc>) -> Result<()>;

    /// Change some fields of the existing pointer.
    async fn update(&self, update: &PointerUpdate, now: DateTime<Utc>) -> Result<()>;
}

/// Storage for round snapshots, addressed by document path.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The snapshot stored at `path`, or `None` if nothing was written there yet.
    async fn get(&self, path: &str) -> Result<Option<Round>>;

    /// Store `round` at `path`, replacing the previous snapshot.
    async fn set(&self, path: &str, round: &Round) -> Result<()>;
}
