use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{Result, WatchError};
use crate::model::{PointerUpdate, Round, RoundPointer};
use crate::store::{PointerStore, SnapshotStore};

/// In-memory pointer and snapshot storage for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pointer: RwLock<Option<RoundPointer>>,
    snapshots: RwLock<HashMap<String, Round>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out with `pointer` already saved.
    pub fn with_pointer(pointer: RoundPointer) -> Self {
        Self {
            pointer: RwLock::new(Some(pointer)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PointerStore for MemoryStore {
    async fn get(&self) -> Result<Option<RoundPointer>> {
        Ok(self.pointer.read().await.clone())
    }

    async fn set(&self, document_path: &str, round_id: &str, now: DateTime<Utc>) -> Result<()> {
        *self.pointer.write().await = Some(RoundPointer::tracking(document_path, round_id, now));
        Ok(())
    }

    async fn update(&self, update: &PointerUpdate, now: DateTime<Utc>) -> Result<()> {
        let mut pointer = self.pointer.write().await;
        let pointer = pointer.as_mut().ok_or_else(|| WatchError::MalformedPointer {
            reason: "no pointer to update".to_string(),
        })?;
        pointer.apply(update, now);
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Round>> {
        Ok(self.snapshots.read().await.get(path).cloned())
    }

    async fn set(&self, path: &str, round: &Round) -> Result<()> {
        self.snapshots
            .write()
            .await
            .insert(path.to_string(), round.clone());
        Ok(())
    }
}
