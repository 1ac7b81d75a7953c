use chrono::{Days, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::provider::MatchSource;

/// Find the round that should be tracked next.
///
/// Walks forward one day at a time from `today`. The first day with fixtures
/// carrying a numeric round decides: the smallest such round wins, unless it
/// equals `exclude`. Returns `Ok(None)` when nothing turns up within the
/// lookahead, which is the normal state between seasons.
#[instrument(skip(source))]
pub async fn discover_round(
    source: &dyn MatchSource,
    competition_id: u32,
    today: NaiveDate,
    lookahead_days: u32,
    exclude: Option<&str>,
) -> Result<Option<String>> {
    for offset in 0..lookahead_days {
        let Some(day) = today.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };

        let fixtures = source.fixtures_on(competition_id, day).await?;
        if fixtures.is_empty() {
            continue;
        }

        let round = fixtures
            .iter()
            .filter_map(|f| f.round())
            .filter_map(|r| r.parse::<u32>().ok())
            .filter(|r| exclude != Some(r.to_string().as_str()))
            .min();

        match round {
            Some(round) => {
                info!(round, %day, "discovered current round");
                return Ok(Some(round.to_string()));
            }
            None => debug!(%day, count = fixtures.len(), "fixtures without a usable round"),
        }
    }

    warn!(
        competition_id,
        lookahead_days, "no upcoming round found within lookahead"
    );
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::WatchError;
    use crate::model::RawMatch;

    /// Serves canned fixtures per day and counts lookups.
    #[derive(Default)]
    struct DailyFixtures {
        days: HashMap<NaiveDate, Vec<RawMatch>>,
        failing_day: Option<NaiveDate>,
        lookups: Mutex<Vec<NaiveDate>>,
    }

    #[async_trait]
    impl MatchSource for DailyFixtures {
        async fn fixtures(&self, _: u32, _: &str) -> Result<Vec<RawMatch>> {
            Ok(vec![])
        }

        async fn fixtures_on(&self, _: u32, date: NaiveDate) -> Result<Vec<RawMatch>> {
            self.lookups.lock().unwrap().push(date);
            if self.failing_day == Some(date) {
                return Err(WatchError::Provider {
                    url: "fixtures/list.json".to_string(),
                    message: "quota exceeded".to_string(),
                });
            }
            Ok(self.days.get(&date).cloned().unwrap_or_default())
        }

        async fn live(&self, _: u32) -> Result<Vec<RawMatch>> {
            Ok(vec![])
        }

        async fn results(&self, _: u32, _: NaiveDate, _: NaiveDate) -> Result<Vec<RawMatch>> {
            Ok(vec![])
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn with_rounds(rounds: &[serde_json::Value]) -> Vec<RawMatch> {
        rounds
            .iter()
            .map(|r| RawMatch::from_value(json!({"id": 1, "round": r})).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_first_day_with_fixtures_wins() {
        let mut source = DailyFixtures::default();
        source.days.insert(day(3), with_rounds(&[json!("11"), json!(10)]));
        source.days.insert(day(5), with_rounds(&[json!("9")]));

        let round = discover_round(&source, 1, day(1), 30, None).await.unwrap();
        assert_eq!(round.as_deref(), Some("10"));
        assert_eq!(source.lookups.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_days_without_numeric_round_are_skipped() {
        let mut source = DailyFixtures::default();
        source.days.insert(day(1), with_rounds(&[json!("Final")]));
        source.days.insert(day(2), with_rounds(&[json!(12)]));

        let round = discover_round(&source, 1, day(1), 30, None).await.unwrap();
        assert_eq!(round.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_excluded_round_is_not_rediscovered() {
        let mut source = DailyFixtures::default();
        source.days.insert(day(1), with_rounds(&[json!(9)]));
        source.days.insert(day(4), with_rounds(&[json!(10)]));

        let round = discover_round(&source, 1, day(1), 30, Some("9"))
            .await
            .unwrap();
        assert_eq!(round.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_nothing_in_lookahead() {
        let source = DailyFixtures::default();
        let round = discover_round(&source, 1, day(1), 7, None).await.unwrap();
        assert_eq!(round, None);
        assert_eq!(source.lookups.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts() {
        let source = DailyFixtures {
            failing_day: Some(day(2)),
            ..DailyFixtures::default()
        };
        let result = discover_round(&source, 1, day(1), 30, None).await;
        assert!(result.is_err());
    }
}
