use tracing::debug;

use crate::model::MatchStatus;

// Provider vocabularies, upper-cased. LiveScore sends long forms, API-Football short codes.
const IN_PLAY: &[&str] = &[
    "IN PLAY",
    "ADDED TIME",
    "LIVE",
    "EXTRA TIME",
    "PENALTIES",
    "1H",
    "2H",
    "ET",
    "BT",
    "P",
    "SUSP",
    "INT",
];
const HALF_TIME: &[&str] = &["HALF TIME BREAK", "HALF TIME", "HT"];
const COMPLETED: &[&str] = &[
    "FINISHED",
    "FULL TIME",
    "AFTER EXTRA TIME",
    "FT",
    "AET",
    "PEN",
    "ABD",
    "AWD",
    "WO",
];
const NOT_STARTED: &[&str] = &[
    "SCHEDULED",
    "NOT STARTED",
    "POSTPONED",
    "CANCELLED",
    "NS",
    "TBD",
    "PST",
    "CANC",
];

/// Map a raw provider status token onto the canonical status.
///
/// Unrecognised tokens fall back to [`MatchStatus::NotStarted`]; the raw token
/// is only logged.
pub fn normalize_status(raw: &str) -> MatchStatus {
    let token = raw.trim().to_uppercase();
    let token = token.as_str();

    if HALF_TIME.contains(&token) {
        MatchStatus::HalfTime
    } else if IN_PLAY.contains(&token) {
        MatchStatus::InPlay
    } else if COMPLETED.contains(&token) {
        MatchStatus::Completed
    } else {
        if !token.is_empty() && !NOT_STARTED.contains(&token) {
            debug!(token = raw, "unrecognised match status, treating as not started");
        }
        MatchStatus::NotStarted
    }
}
