use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchError};

/// `document_path` value marking that no round is being tracked.
pub const COMPLETED_SENTINEL: &str = "completed";

/// The single persisted cursor naming the round currently tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPointer {
    pub document_path: String,
    #[serde(default)]
    pub round_id: Option<String>,
    #[serde(default)]
    pub announcement_post_id: Option<String>,
    #[serde(default)]
    pub announcement_finalized: bool,
    pub last_updated_utc: DateTime<Utc>,
}

impl RoundPointer {
    /// A fresh pointer for a newly discovered round.
    pub fn tracking(document_path: &str, round_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            document_path: document_path.to_string(),
            round_id: Some(round_id.to_string()),
            announcement_post_id: None,
            announcement_finalized: false,
            last_updated_utc: now,
        }
    }

    /// Whether the pointer marks the end of a round rather than a live one.
    pub fn is_completed(&self) -> bool {
        self.document_path == COMPLETED_SENTINEL
    }

    /// Apply a partial update, touching `last_updated_utc`.
    pub fn apply(&mut self, update: &PointerUpdate, now: DateTime<Utc>) {
        if let Some(path) = &update.document_path {
            self.document_path.clone_from(path);
        }
        if let Some(post_id) = &update.announcement_post_id {
            self.announcement_post_id = Some(post_id.clone());
        }
        if let Some(finalized) = update.announcement_finalized {
            self.announcement_finalized = finalized;
        }
        self.last_updated_utc = now;
    }
}

/// Fields to change on the pointer; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerUpdate {
    pub document_path: Option<String>,
    pub announcement_post_id: Option<String>,
    pub announcement_finalized: Option<bool>,
}

impl PointerUpdate {
    /// Retire the pointer once its round has finished.
    pub fn completed() -> Self {
        Self {
            document_path: Some(COMPLETED_SENTINEL.to_string()),
            ..Self::default()
        }
    }

    pub fn post_created(post_id: &str) -> Self {
        Self {
            announcement_post_id: Some(post_id.to_string()),
            ..Self::default()
        }
    }

    pub fn finalized() -> Self {
        Self {
            announcement_finalized: Some(true),
            ..Self::default()
        }
    }
}

/// What the tracker should do this invocation, derived from the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Tracking {
    /// No live round; a new one must be discovered. Carries the round that
    /// was just completed, if the pointer still names it.
    Discovering { previous_round: Option<String> },
    /// A round is being followed.
    Round {
        round_id: String,
        document_path: String,
    },
}

impl Tracking {
    /// Derive the tracking state from the stored pointer.
    pub fn from_pointer(pointer: Option<&RoundPointer>) -> Result<Self> {
        let Some(pointer) = pointer else {
            return Ok(Tracking::Discovering {
                previous_round: None,
            });
        };

        if pointer.is_completed() {
            return Ok(Tracking::Discovering {
                previous_round: pointer.round_id.clone(),
            });
        }

        let round_id = pointer
            .round_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| WatchError::MalformedPointer {
                reason: format!("pointer at {} has no round_id", pointer.document_path),
            })?;

        if pointer.document_path.trim().is_empty() {
            return Err(WatchError::MalformedPointer {
                reason: format!("pointer for round {round_id} has an empty document_path"),
            });
        }

        Ok(Tracking::Round {
            round_id,
            document_path: pointer.document_path.clone(),
        })
    }
}
