//! Sports-data providers feeding the round snapshot.

mod api_football;
mod livescore;

pub use api_football::ApiFootballClient;
pub use livescore::LiveScoreClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, WatchError};
use crate::model::RawMatch;

/// Read access to a provider's match feeds.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// All fixtures scheduled for a competition round.
    async fn fixtures(&self, competition_id: u32, round_id: &str) -> Result<Vec<RawMatch>>;

    /// All fixtures of a competition on one calendar day.
    async fn fixtures_on(&self, competition_id: u32, date: NaiveDate) -> Result<Vec<RawMatch>>;

    /// Matches of a competition that are currently live.
    async fn live(&self, competition_id: u32) -> Result<Vec<RawMatch>>;

    /// Finished matches of a competition between two days, across rounds.
    async fn results(
        &self,
        competition_id: u32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawMatch>>;
}

/// Issue a GET request and decode the JSON body.
///
/// `query` is sent as-is; callers keep credentials out of `url` so the url
/// can be logged and reported in errors.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    send_json(client.get(url).query(query), url).await
}

/// Send a prepared request and decode the JSON body. `url` is only used for
/// logging and errors.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<T> {
    debug!(url, "fetching feed");

    let response = request.send().await.map_err(|e| WatchError::Http {
        url: url.to_owned(),
        source: e.without_url(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(WatchError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }

    let body = response.bytes().await.map_err(|e| WatchError::Http {
        url: url.to_owned(),
        source: e.without_url(),
    })?;

    Ok(serde_json::from_slice(&body)?)
}
