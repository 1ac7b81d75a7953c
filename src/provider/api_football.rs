use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::ApiFootballConfig;
use crate::error::{Result, WatchError};
use crate::model::RawMatch;
use crate::provider::{send_json, MatchSource};
use crate::tracker::normalize_status;

const DATE_FORMAT: &str = "%Y-%m-%d";
const FINISHED: &str = "FT-AET-PEN";

#[derive(Debug, Deserialize)]
struct Envelope {
    // An empty list when fine, an object keyed by parameter when not.
    #[serde(default)]
    errors: Value,
    #[serde(default)]
    response: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FixtureItem {
    fixture: FixtureInfo,
    #[serde(default)]
    league: LeagueInfo,
    teams: Teams,
    #[serde(default)]
    goals: Goals,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    id: u64,
    date: Option<String>,
    #[serde(default)]
    status: StatusInfo,
}

#[derive(Debug, Default, Deserialize)]
struct StatusInfo {
    short: Option<String>,
    elapsed: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LeagueInfo {
    round: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Teams {
    home: Team,
    away: Team,
}

#[derive(Debug, Deserialize)]
struct Team {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Goals {
    home: Option<u32>,
    away: Option<u32>,
}

/// Client for the API-Football v3 `fixtures` endpoint.
///
/// Fixtures are projected onto the same record fields the LiveScore feeds use
/// (`fixture_id`, `date`, `time`, `status`, `round`, `home.name`, `away.name`,
/// `scores.score`), so the merge does not care which provider is configured.
/// Statuses stay in API-Football's short codes.
pub struct ApiFootballClient {
    http: reqwest::Client,
    base_url: String,
    host: Option<String>,
    key: String,
    season: String,
    round_prefix: String,
}

impl ApiFootballClient {
    /// Create a client with its own HTTP connection pool and request timeout.
    pub fn new(config: &ApiFootballConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WatchError::Http {
                url: config.base_url.clone(),
                source: e,
            })?;
        Ok(Self::with_client(http, config))
    }

    /// Create a client using the provided [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ApiFootballConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let host = url::Url::parse(&base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));
        Self {
            http: client,
            base_url,
            host,
            key: config.key.clone(),
            season: config.season.clone(),
            round_prefix: config.round_prefix.clone(),
        }
    }

    async fn fetch(&self, params: Vec<(&'static str, String)>) -> Result<Vec<RawMatch>> {
        let url = format!("{}/fixtures", self.base_url);
        let mut query = params;
        query.push(("timezone", "UTC".to_string()));

        let mut request = self
            .http
            .get(&url)
            .query(&query)
            .header("x-rapidapi-key", &self.key);
        if let Some(host) = &self.host {
            request = request.header("x-rapidapi-host", host);
        }

        let envelope: Envelope = send_json(request, &url).await?;
        if has_errors(&envelope.errors) {
            return Err(WatchError::Provider {
                url,
                message: envelope.errors.to_string(),
            });
        }
        let items = envelope.response.ok_or_else(|| WatchError::Provider {
            url: url.clone(),
            message: "response is missing the `response` list".to_string(),
        })?;

        let total = items.len();
        let records: Vec<RawMatch> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<FixtureItem>(item) {
                Ok(item) => Some(project(item, &self.round_prefix)),
                Err(e) => {
                    warn!(error = %e, "skipping malformed fixture");
                    None
                }
            })
            .collect();
        debug!(total, kept = records.len(), "fetched fixtures");
        Ok(records)
    }

    fn league(&self, competition_id: u32) -> Vec<(&'static str, String)> {
        vec![
            ("league", competition_id.to_string()),
            ("season", self.season.clone()),
        ]
    }
}

#[async_trait]
impl MatchSource for ApiFootballClient {
    #[instrument(skip(self))]
    async fn fixtures(&self, competition_id: u32, round_id: &str) -> Result<Vec<RawMatch>> {
        let mut params = self.league(competition_id);
        params.push(("round", format!("{}{round_id}", self.round_prefix)));
        self.fetch(params).await
    }

    #[instrument(skip(self))]
    async fn fixtures_on(&self, competition_id: u32, date: NaiveDate) -> Result<Vec<RawMatch>> {
        let mut params = self.league(competition_id);
        params.push(("date", date.format(DATE_FORMAT).to_string()));
        self.fetch(params).await
    }

    #[instrument(skip(self))]
    async fn live(&self, competition_id: u32) -> Result<Vec<RawMatch>> {
        self.fetch(vec![("live", competition_id.to_string())]).await
    }

    #[instrument(skip(self))]
    async fn results(
        &self,
        competition_id: u32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawMatch>> {
        let mut params = self.league(competition_id);
        params.push(("from", from.format(DATE_FORMAT).to_string()));
        params.push(("to", to.format(DATE_FORMAT).to_string()));
        params.push(("status", FINISHED.to_string()));
        self.fetch(params).await
    }
}

fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Null => false,
        _ => true,
    }
}

/// Flatten one API-Football fixture into the shared record fields.
fn project(item: FixtureItem, round_prefix: &str) -> RawMatch {
    let mut fields = Map::new();
    fields.insert("fixture_id".into(), json!(item.fixture.id));

    let kickoff = item
        .fixture
        .date
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc));
    let scheduled = kickoff.map(|at| at.format("%H:%M").to_string());
    if let Some(at) = kickoff {
        fields.insert("date".into(), json!(at.format(DATE_FORMAT).to_string()));
    }

    let short = item.fixture.status.short.unwrap_or_default();
    let status = normalize_status(&short);
    // Live records carry the elapsed minute in `time`, like the LiveScore live feed.
    let time = if status.is_live() {
        match item.fixture.status.elapsed {
            _ if short.eq_ignore_ascii_case("HT") => Some("HT".to_string()),
            Some(elapsed) => Some(elapsed.to_string()),
            None => None,
        }
    } else {
        scheduled.clone()
    };
    if let Some(scheduled) = scheduled {
        fields.insert("scheduled".into(), json!(scheduled));
    }
    if let Some(time) = time {
        fields.insert("time".into(), json!(time));
    }
    fields.insert("status".into(), json!(short));

    if let Some(round) = item.league.round.as_deref().and_then(|r| round_number(r, round_prefix)) {
        fields.insert("round".into(), json!(round));
    }
    fields.insert("home".into(), json!({ "name": item.teams.home.name }));
    fields.insert("away".into(), json!({ "name": item.teams.away.name }));
    if let (Some(home), Some(away)) = (item.goals.home, item.goals.away) {
        fields.insert("scores".into(), json!({ "score": format!("{home} - {away}") }));
    }

    RawMatch::new(fields)
}

/// `Regular Season - 9` becomes `9`. Names without the prefix keep the part
/// after the last ` - `, or the whole name.
fn round_number(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.trim();
    let round = raw
        .strip_prefix(prefix)
        .or_else(|| raw.rsplit_once(" - ").map(|(_, tail)| tail))
        .unwrap_or(raw)
        .trim();
    (!round.is_empty()).then(|| round.to_string())
}
