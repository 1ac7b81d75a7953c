use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::CadenceConfig;
use crate::model::{Match, MatchStatus, Round, RoundAnalysis, RoundState};

/// Reduce a set of per-match statuses to the progress of the whole round.
///
/// Depends only on which statuses are present, never on their order or count.
pub fn classify(statuses: &HashSet<MatchStatus>) -> RoundState {
    let live = statuses.iter().any(|s| s.is_live());
    let completed = statuses.contains(&MatchStatus::Completed);
    let not_started = statuses.contains(&MatchStatus::NotStarted);

    if statuses.is_empty() {
        RoundState::Completed
    } else if live {
        RoundState::InPlay
    } else if completed && !not_started {
        RoundState::Completed
    } else if not_started && !completed {
        RoundState::NotStarted
    } else if completed && not_started {
        RoundState::PartiallyCompleted
    } else {
        RoundState::Unknown
    }
}

/// Earliest kickoff among matches that have not started yet.
///
/// Matches without a usable kickoff are skipped.
pub fn earliest_pending_kickoff(matches: &[Match]) -> Option<DateTime<Utc>> {
    matches
        .iter()
        .filter(|m| m.status == MatchStatus::NotStarted)
        .filter_map(|m| {
            let kickoff = m.kickoff_at();
            if kickoff.is_none() {
                debug!(id = %m.id, "skipping match without a usable kickoff");
            }
            kickoff
        })
        .min()
}

/// Classify a round snapshot and work out when the tracker must run next.
pub fn analyze(round: &Round, now: DateTime<Utc>, cadence: &CadenceConfig) -> RoundAnalysis {
    if round.matches.is_empty() {
        warn!(round_id = %round.round_id, "round has no matches, treating as completed");
        return RoundAnalysis {
            round_state: RoundState::Completed,
            next_run_at: None,
        };
    }

    let statuses: HashSet<MatchStatus> = round.matches.iter().map(|m| m.status).collect();
    let round_state = classify(&statuses);
    let poll = now + to_chrono(cadence.live_poll_interval);

    let next_run_at = match round_state {
        RoundState::InPlay => Some(poll),
        RoundState::NotStarted | RoundState::PartiallyCompleted => {
            Some(match earliest_pending_kickoff(&round.matches) {
                None => poll,
                Some(kickoff) if kickoff <= now => {
                    debug!(%kickoff, "kickoff already passed, feed is lagging");
                    poll
                }
                Some(kickoff) => {
                    let check_in = kickoff - to_chrono(cadence.lead_window);
                    if check_in > now {
                        check_in
                    } else {
                        kickoff
                    }
                }
            })
        }
        RoundState::Completed => None,
        RoundState::Unknown => {
            warn!(?statuses, "could not classify round progress");
            Some(now + to_chrono(cadence.unknown_retry))
        }
    };

    debug!(
        round_id = %round.round_id,
        state = %round_state,
        next_run_at = ?next_run_at,
        "analyzed round"
    );

    RoundAnalysis {
        round_state,
        next_run_at,
    }
}

/// Convert a configured duration, saturating on absurdly large values.
pub(crate) fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or(Duration::MAX)
}
