use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::{Result, WatchError};
use crate::model::{parse_kickoff, Match, RawMatch, Round};
use crate::tracker::{status, teams};

// Baseline date/time are copied here so overlays cannot clobber the scheduled kickoff.
const SCHEDULED_DATE: &str = "scheduled_date";
const SCHEDULED_TIME: &str = "scheduled_time";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The three independently fetched inputs of a round snapshot.
///
/// `None` means the fetch failed, which is different from an empty list.
#[derive(Debug, Clone, Default)]
pub struct RoundFeeds {
    pub baseline: Option<Vec<RawMatch>>,
    pub live: Option<Vec<RawMatch>>,
    pub results: Option<Vec<RawMatch>>,
}

/// Merge the feeds into one canonical round snapshot.
///
/// Precedence is baseline, then live, then results. Results entries for other
/// rounds are ignored. Fails without producing a partial round when any feed
/// is missing.
pub fn consolidate(
    feeds: RoundFeeds,
    round_id: &str,
    competition_name: &str,
    now: DateTime<Utc>,
) -> Result<Round> {
    let missing = |feed: &'static str| WatchError::IncompleteFeeds {
        round_id: round_id.to_string(),
        missing: feed,
    };
    let baseline = feeds.baseline.ok_or_else(|| missing("baseline"))?;
    let live = feeds.live.ok_or_else(|| missing("live"))?;
    let results = feeds.results.ok_or_else(|| missing("results"))?;

    let today = now.date_naive();
    let mut merged: BTreeMap<String, RawMatch> = BTreeMap::new();
    let mut dropped = 0usize;

    for mut record in baseline {
        let Some(key) = record.key() else {
            dropped += 1;
            continue;
        };
        if let Some(date) = record.get("date").cloned() {
            record.insert(SCHEDULED_DATE, date);
        }
        let time = record.get("scheduled").or_else(|| record.get("time")).cloned();
        if let Some(time) = time {
            record.insert(SCHEDULED_TIME, time);
        }
        merged.insert(key, record);
    }
    debug!(count = merged.len(), "loaded baseline fixtures");

    for record in live {
        let Some(key) = record.key() else {
            dropped += 1;
            continue;
        };
        match merged.get_mut(&key) {
            Some(existing) => {
                existing.overlay(&record);
                debug!(id = %key, "overlaid live data");
            }
            None => {
                let mut record = record;
                if !record.contains("date") {
                    record.insert("date", today.format(DATE_FORMAT).to_string());
                }
                debug!(id = %key, "match only present in live feed");
                merged.insert(key, record);
            }
        }
    }

    for record in results {
        let Some(key) = record.key() else {
            dropped += 1;
            continue;
        };
        if record.round().as_deref() != Some(round_id) {
            continue;
        }
        match merged.get_mut(&key) {
            Some(existing) => {
                existing.overlay(&record);
                debug!(id = %key, "overlaid result data");
            }
            None => {
                debug!(id = %key, "match only present in results feed");
                merged.insert(key, record);
            }
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped records without a match id");
    }

    let mut matches: Vec<Match> = merged
        .into_iter()
        .map(|(key, record)| to_match(key, &record))
        .collect();
    matches.sort_by(|a, b| (a.date, a.kickoff_time).cmp(&(b.date, b.kickoff_time)));

    info!(
        round_id,
        count = matches.len(),
        "consolidated round snapshot"
    );

    Ok(Round {
        round_id: round_id.to_string(),
        competition_name: competition_name.to_string(),
        matches,
        last_updated_utc: now,
    })
}

fn to_match(id: String, record: &RawMatch) -> Match {
    let raw_status = record
        .text("status")
        .unwrap_or_else(|| "SCHEDULED".to_string());
    let status = status::normalize_status(&raw_status);

    let date = record
        .text(SCHEDULED_DATE)
        .or_else(|| record.text("date"))
        .and_then(|raw| {
            let day = raw.get(..10).unwrap_or(raw.as_str());
            NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
        });

    // On a live record `time` is the elapsed minute, not the kickoff.
    let kickoff_raw = record
        .text(SCHEDULED_TIME)
        .or_else(|| record.text("scheduled"))
        .or_else(|| {
            record
                .text("time")
                .filter(|raw| !status.is_live() || raw.contains(':'))
        });
    let kickoff_time = kickoff_raw.as_deref().and_then(parse_kickoff);
    if kickoff_time.is_none() {
        if let Some(raw) = &kickoff_raw {
            warn!(id = %id, kickoff = %raw, "unparsable kickoff time");
        }
    }

    let home_team = record
        .nested_text("home", "name")
        .unwrap_or_else(|| "N/A".to_string());
    let away_team = record
        .nested_text("away", "name")
        .unwrap_or_else(|| "N/A".to_string());

    Match {
        id,
        date,
        kickoff_time,
        home_local_name: teams::local_name(&home_team),
        away_local_name: teams::local_name(&away_team),
        home_link: teams::community_link(&home_team),
        away_link: teams::community_link(&away_team),
        home_team,
        away_team,
        status,
        score: record.nested_text("scores", "score").unwrap_or_default(),
        live_minute: status.is_live().then(|| record.text("time")).flatten(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone};
    use serde_json::{json, Value};

    use super::*;
    use crate::model::MatchStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 17, 10, 0).unwrap()
    }

    fn raws(values: Vec<Value>) -> Vec<RawMatch> {
        values
            .into_iter()
            .filter_map(RawMatch::from_value)
            .collect()
    }

    fn fixture(id: u32, date: &str, time: &str, home: &str, away: &str) -> Value {
        json!({
            "id": id,
            "date": date,
            "time": time,
            "round": "9",
            "home": {"name": home},
            "away": {"name": away},
        })
    }

    fn feeds(baseline: Vec<Value>, live: Vec<Value>, results: Vec<Value>) -> RoundFeeds {
        RoundFeeds {
            baseline: Some(raws(baseline)),
            live: Some(raws(live)),
            results: Some(raws(results)),
        }
    }

    #[test]
    fn test_missing_feed_aborts() {
        let mut input = feeds(vec![], vec![], vec![]);
        input.live = None;
        let err = consolidate(input, "9", "Super League", now()).unwrap_err();
        assert!(matches!(
            err,
            WatchError::IncompleteFeeds {
                missing: "live",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_feeds_give_empty_round() {
        let round = consolidate(feeds(vec![], vec![], vec![]), "9", "Super League", now()).unwrap();
        assert!(round.matches.is_empty());
        assert_eq!(round.round_id, "9");
        assert_eq!(round.last_updated_utc, now());
    }

    #[test]
    fn test_results_win_but_scheduled_kickoff_survives() {
        let baseline = vec![fixture(1, "2025-03-01", "16:00:00", "AEK Athens", "OFI Crete")];
        let live = vec![json!({
            "id": 90001,
            "fixture_id": 1,
            "status": "IN PLAY",
            "time": "78",
            "scheduled": "16:00",
            "scores": {"score": "1 - 0"},
        })];
        let results = vec![json!({
            "id": 70001,
            "fixture_id": 1,
            "round": "9",
            "date": "2025-03-02",
            "time": "19:30",
            "status": "FINISHED",
            "scores": {"score": "2 - 1"},
            "home": {"name": "AEK Athens"},
            "away": {"name": "OFI Crete"},
        })];

        let round = consolidate(feeds(baseline, live, results), "9", "Super League", now()).unwrap();
        assert_eq!(round.matches.len(), 1);
        let m = &round.matches[0];
        assert_eq!(m.id, "1");
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.score, "2 - 1");
        assert_eq!(m.live_minute, None);
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(m.kickoff_time, NaiveTime::from_hms_opt(16, 0, 0));
        assert_eq!(m.home_local_name.as_deref(), Some("Α.Ε.Κ."));
        assert_eq!(m.away_link, None);
    }

    #[test]
    fn test_live_overlay_sets_minute() {
        let baseline = vec![fixture(1, "2025-03-01", "16", "Kifisia", "Levadiakos")];
        let live = vec![json!({"fixture_id": "1", "status": "in play", "time": "34"})];

        let round = consolidate(feeds(baseline, live, vec![]), "9", "Super League", now()).unwrap();
        let m = &round.matches[0];
        assert_eq!(m.status, MatchStatus::InPlay);
        assert_eq!(m.live_minute.as_deref(), Some("34"));
        assert_eq!(m.kickoff_time, NaiveTime::from_hms_opt(16, 0, 0));
    }

    #[test]
    fn test_live_only_match_is_dated_today() {
        let live = vec![json!({
            "id": 5,
            "fixture_id": 42,
            "status": "HALF TIME BREAK",
            "time": "HT",
            "scheduled": "16:30",
            "home": {"name": "Panetolikos"},
            "away": {"name": "Atromitos"},
        })];

        let round = consolidate(feeds(vec![], live, vec![]), "9", "Super League", now()).unwrap();
        let m = &round.matches[0];
        assert_eq!(m.id, "42");
        assert_eq!(m.date, Some(now().date_naive()));
        assert_eq!(m.kickoff_time, NaiveTime::from_hms_opt(16, 30, 0));
        assert_eq!(m.status, MatchStatus::HalfTime);
        assert_eq!(m.live_minute.as_deref(), Some("HT"));
    }

    #[test]
    fn test_live_minute_is_not_taken_as_kickoff() {
        let live = vec![json!({
            "fixture_id": 43,
            "status": "IN PLAY",
            "time": "12",
            "home": {"name": "Panetolikos"},
            "away": {"name": "Atromitos"},
        })];

        let round = consolidate(feeds(vec![], live, vec![]), "9", "Super League", now()).unwrap();
        let m = &round.matches[0];
        assert_eq!(m.status, MatchStatus::InPlay);
        assert_eq!(m.kickoff_time, None);
        assert_eq!(m.live_minute.as_deref(), Some("12"));
    }

    #[test]
    fn test_baseline_prefers_explicit_scheduled_time() {
        let baseline = vec![json!({
            "fixture_id": 44,
            "date": "2025-03-01",
            "status": "2H",
            "time": "67",
            "scheduled": "17:00",
        })];

        let round = consolidate(feeds(baseline, vec![], vec![]), "9", "Super League", now()).unwrap();
        let m = &round.matches[0];
        assert_eq!(m.kickoff_time, NaiveTime::from_hms_opt(17, 0, 0));
        assert_eq!(m.live_minute.as_deref(), Some("67"));
    }

    #[test]
    fn test_results_from_other_rounds_ignored() {
        let results = vec![
            json!({"fixture_id": 3, "round": "8", "status": "FINISHED", "date": "2025-02-22", "time": "16:00"}),
            json!({"fixture_id": 4, "round": 9, "status": "FINISHED", "date": "2025-02-28", "time": "18:00"}),
            json!({"fixture_id": 5, "status": "FINISHED"}),
        ];

        let round = consolidate(feeds(vec![], vec![], results), "9", "Super League", now()).unwrap();
        let ids: Vec<_> = round.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["4"]);
    }

    #[test]
    fn test_records_without_id_are_dropped() {
        let baseline = vec![
            json!({"date": "2025-03-01", "time": "16:00:00"}),
            fixture(2, "2025-03-01", "18:00:00", "Olympiacos", "Kifisia"),
        ];
        let round = consolidate(feeds(baseline, vec![], vec![]), "9", "Super League", now()).unwrap();
        assert_eq!(round.matches.len(), 1);
        assert_eq!(round.matches[0].id, "2");
    }

    #[test]
    fn test_sorted_by_date_then_kickoff() {
        let baseline = vec![
            fixture(1, "2025-03-02", "16:00:00", "A", "B"),
            fixture(2, "2025-03-01", "20:30:00", "C", "D"),
            fixture(3, "2025-03-01", "9", "E", "F"),
            json!({"id": 4, "time": "12:00:00"}),
        ];
        let round = consolidate(feeds(baseline, vec![], vec![]), "9", "Super League", now()).unwrap();
        let ids: Vec<_> = round.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_unparsable_kickoff_is_absent() {
        let baseline = vec![fixture(1, "2025-03-01", "TBA", "A", "B")];
        let round = consolidate(feeds(baseline, vec![], vec![]), "9", "Super League", now()).unwrap();
        assert_eq!(round.matches[0].kickoff_time, None);
        assert_eq!(round.matches[0].status, MatchStatus::NotStarted);
    }
}
