use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fixture::Match;

/// A snapshot of every match in one competition round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub round_id: String,
    pub competition_name: String,
    /// Ordered by date, then kickoff time.
    pub matches: Vec<Match>,
    pub last_updated_utc: DateTime<Utc>,
}

/// Aggregate progress of a round.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoundState {
    NotStarted,
    InPlay,
    PartiallyCompleted,
    Completed,
    Unknown,
}

/// What the analyzer concluded about a round snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundAnalysis {
    pub round_state: RoundState,
    /// When the tracker must run next; `None` once the round is over.
    pub next_run_at: Option<DateTime<Utc>>,
}
