use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::LiveScoreConfig;
use crate::error::{Result, WatchError};
use crate::model::RawMatch;
use crate::provider::{get_json, MatchSource};

// The API serves at most this many entries per page; a shorter page is the last one.
const PAGE_SIZE: usize = 30;
const MAX_PAGES: u32 = 100;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Client for the livescore-api.com feeds.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> round_watch::Result<()> {
/// use round_watch::config::LiveScoreConfig;
/// use round_watch::provider::{LiveScoreClient, MatchSource};
///
/// let config = LiveScoreConfig {
///     base_url: "https://livescore-api.com/api-client".to_string(),
///     key: "key".to_string(),
///     secret: "secret".to_string(),
///     request_timeout: std::time::Duration::from_secs(15),
/// };
/// let client = LiveScoreClient::new(&config)?;
/// let live = client.live(1).await?;
/// println!("{} live matches", live.len());
/// # Ok(())
/// # }
/// ```
pub struct LiveScoreClient {
    http: reqwest::Client,
    base_url: String,
    key: String,
    secret: String,
}

impl LiveScoreClient {
    /// Create a client with its own HTTP connection pool and request timeout.
    pub fn new(config: &LiveScoreConfig) -> Result<Self> {
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
    pub fn with_client(client: reqwest::Client, config: &LiveScoreConfig) -> Self {
        Self {
            http: client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            secret: config.secret.clone(),
        }
    }

    fn credentials(&self) -> Vec<(&'static str, String)> {
        vec![("key", self.key.clone()), ("secret", self.secret.clone())]
    }

    async fn fetch_page(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
        list_field: &str,
    ) -> Result<Vec<RawMatch>> {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut query = self.credentials();
        query.extend(params.iter().cloned());

        let envelope: Envelope = get_json(&self.http, &url, &query).await?;
        if !envelope.success {
            return Err(WatchError::Provider {
                url,
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "no message".to_string()),
            });
        }

        let items = envelope
            .data
            .and_then(|mut data| data.get_mut(list_field).map(Value::take))
            .and_then(|list| match list {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default();

        Ok(items.into_iter().filter_map(RawMatch::from_value).collect())
    }

    async fn fetch_all_pages(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
        list_field: &str,
    ) -> Result<Vec<RawMatch>> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let mut paged = params.to_vec();
            paged.push(("page", page.to_string()));

            let items = self.fetch_page(endpoint, &paged, list_field).await?;
            let count = items.len();
            all.extend(items);
            debug!(endpoint, page, count, "fetched page");

            if count < PAGE_SIZE {
                return Ok(all);
            }
        }
        warn!(endpoint, pages = MAX_PAGES, "stopped paging at the page limit");
        Ok(all)
    }
}

#[async_trait]
impl MatchSource for LiveScoreClient {
    #[instrument(skip(self))]
    async fn fixtures(&self, competition_id: u32, round_id: &str) -> Result<Vec<RawMatch>> {
        let params = [
            ("competition_id", competition_id.to_string()),
            ("round", round_id.to_string()),
        ];
        self.fetch_all_pages("fixtures/list.json", &params, "fixtures")
            .await
    }

    #[instrument(skip(self))]
    async fn fixtures_on(&self, competition_id: u32, date: NaiveDate) -> Result<Vec<RawMatch>> {
        let params = [
            ("competition_id", competition_id.to_string()),
            ("date", date.format(DATE_FORMAT).to_string()),
        ];
        self.fetch_all_pages("fixtures/list.json", &params, "fixtures")
            .await
    }

    #[instrument(skip(self))]
    async fn live(&self, competition_id: u32) -> Result<Vec<RawMatch>> {
        let params = [("competition_id", competition_id.to_string())];
        let matches = self
            .fetch_page("matches/live.json", &params, "match")
            .await?;
        debug!(count = matches.len(), "fetched live matches");
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn results(
        &self,
        competition_id: u32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawMatch>> {
        let params = [
            ("competition_id", competition_id.to_string()),
            ("from", from.format(DATE_FORMAT).to_string()),
            ("to", to.format(DATE_FORMAT).to_string()),
        ];
        self.fetch_all_pages("matches/history.json", &params, "match")
            .await
    }
}
