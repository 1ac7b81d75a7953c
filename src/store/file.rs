use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{Result, WatchError};
use crate::model::{PointerUpdate, Round, RoundPointer};
use crate::store::{PointerStore, SnapshotStore};

const POINTER_PATH: &str = "system_state/current_round_pointer";

/// JSON documents on the local filesystem, one file per document path.
///
/// A document at `leagues/x/rounds/9` lives in `<root>/leagues/x/rounds/9.json`.
/// Writes land in a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// A store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_for(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(WatchError::MalformedSnapshot {
                path: path.to_string(),
                reason: "document path must be relative and must not leave the store".to_string(),
            });
        }
        Ok(self.root.join(format!("{path}.json")))
    }

    async fn read(&self, file: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(file).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WatchError::Io {
                path: file.to_path_buf(),
                source: e,
            }),
        }
    }

    async fn write<T: Serialize>(&self, file: &Path, document: &T) -> Result<()> {
        let io = |e: std::io::Error| WatchError::Io {
            path: file.to_path_buf(),
            source: e,
        };

        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }
        let body = serde_json::to_vec_pretty(document)?;
        let staging = file.with_extension("json.tmp");
        tokio::fs::write(&staging, body).await.map_err(io)?;
        tokio::fs::rename(&staging, file).await.map_err(io)?;
        debug!(file = %file.display(), "document written");
        Ok(())
    }
}

#[async_trait]
impl PointerStore for FileStore {
    async fn get(&self) -> Result<Option<RoundPointer>> {
        let file = self.file_for(POINTER_PATH)?;
        let Some(bytes) = self.read(&file).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| WatchError::MalformedPointer {
                reason: e.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn set(&self, document_path: &str, round_id: &str, now: DateTime<Utc>) -> Result<()> {
        let file = self.file_for(POINTER_PATH)?;
        let pointer = RoundPointer::tracking(document_path, round_id, now);
        self.write(&file, &pointer).await
    }

    #[instrument(skip(self))]
    async fn update(&self, update: &PointerUpdate, now: DateTime<Utc>) -> Result<()> {
        let mut pointer = PointerStore::get(self)
            .await?
            .ok_or_else(|| WatchError::MalformedPointer {
                reason: "no pointer to update".to_string(),
            })?;
        pointer.apply(update, now);
        let file = self.file_for(POINTER_PATH)?;
        self.write(&file, &pointer).await
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn get(&self, path: &str) -> Result<Option<Round>> {
        let file = self.file_for(path)?;
        let Some(bytes) = self.read(&file).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| WatchError::MalformedSnapshot {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    #[instrument(skip(self, round), fields(matches = round.matches.len()))]
    async fn set(&self, path: &str, round: &Round) -> Result<()> {
        let file = self.file_for(path)?;
        self.write(&file, round).await
    }
}
