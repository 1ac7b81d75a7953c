use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical progress of a single match, independent of any provider vocabulary.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    NotStarted,
    InPlay,
    HalfTime,
    Completed,
}

impl MatchStatus {
    /// Whether the match is currently being played (including the break).
    pub fn is_live(self) -> bool {
        matches!(self, MatchStatus::InPlay | MatchStatus::HalfTime)
    }
}

/// One fixture of a round, after all feeds have been merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub date: Option<NaiveDate>,
    /// Scheduled kickoff (UTC), stored as `HH:MM`.
    #[serde(with = "kickoff_format", default)]
    pub kickoff_time: Option<NaiveTime>,
    pub home_team: String,
    pub away_team: String,
    pub home_local_name: Option<String>,
    pub away_local_name: Option<String>,
    pub home_link: Option<String>,
    pub away_link: Option<String>,
    pub status: MatchStatus,
    #[serde(default)]
    pub score: String,
    pub live_minute: Option<String>,
}

impl Match {
    /// The scheduled kickoff instant, when both date and time are known.
    pub fn kickoff_at(&self) -> Option<DateTime<Utc>> {
        let date = self.date?;
        let time = self.kickoff_time?;
        Some(date.and_time(time).and_utc())
    }
}

/// Parse a kickoff time-of-day as providers send it.
///
/// Accepts `"16"`, `"16:30"` and `"16:30:00"`; anything else is `None`.
pub fn parse_kickoff(raw: &str) -> Option<NaiveTime> {
    let parts = raw
        .trim()
        .split(':')
        .map(|part| {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                part.parse::<u32>().ok()
            }
        })
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [h] => NaiveTime::from_hms_opt(*h, 0, 0),
        [h, m] => NaiveTime::from_hms_opt(*h, *m, 0),
        [h, m, s] => NaiveTime::from_hms_opt(*h, *m, *s),
        _ => None,
    }
}

mod kickoff_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => s.serialize_str(&time.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(super::parse_kickoff))
    }
}
