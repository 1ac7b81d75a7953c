use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::announce::{render, Announcer};
use crate::config::RedditConfig;
use crate::error::{Result, WatchError};
use crate::model::Round;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    json: ApiBody,
}

#[derive(Debug, Deserialize)]
struct ApiBody {
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    name: Option<String>,
}

/// Publishes round threads to a subreddit.
///
/// Every call exchanges the refresh token for a fresh access token.
pub struct RedditAnnouncer {
    http: reqwest::Client,
    config: RedditConfig,
    round_label: String,
}

impl RedditAnnouncer {
    /// Create an announcer with its own HTTP client and request timeout.
    pub fn new(config: &RedditConfig, round_label: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WatchError::Http {
                url: config.api_base.clone(),
                source: e,
            })?;
        Ok(Self::with_client(http, config, round_label))
    }

    /// Create an announcer using the provided [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &RedditConfig, round_label: &str) -> Self {
        let mut config = config.clone();
        config.api_base = config.api_base.trim_end_matches('/').to_string();
        config.auth_base = config.auth_base.trim_end_matches('/').to_string();
        Self {
            http: client,
            config,
            round_label: round_label.to_string(),
        }
    }

    async fn send<T: DeserializeOwned>(url: &str, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| WatchError::Http {
            url: url.to_owned(),
            source: e,
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
            source: e,
        })?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn access_token(&self) -> Result<String> {
        let url = format!("{}/api/v1/access_token", self.config.auth_base);
        let request = self
            .http
            .post(&url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.config.refresh_token.as_str()),
            ]);

        let token: TokenResponse = Self::send(&url, request).await?;
        token.access_token.ok_or_else(|| WatchError::Announcement {
            operation: "authenticate",
            reason: "token response carried no access_token".to_string(),
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        request
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
    }

    async fn find_post(&self, token: &str, title: &str) -> Result<Option<String>> {
        let url = format!("{}/r/{}/search.json", self.config.api_base, self.config.subreddit);
        let query = format!("title:\"{title}\"");
        let request = self.authorized(self.http.get(&url), token).query(&[
            ("q", query.as_str()),
            ("restrict_sr", "on"),
            ("sort", "new"),
            ("limit", "1"),
        ]);

        let listing: Listing = Self::send(&url, request).await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .next()
            .filter(|child| child.data.title == title)
            .map(|child| child.data.name))
    }

    async fn post_form(
        &self,
        endpoint: &str,
        operation: &'static str,
        token: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiBody> {
        let url = format!("{}/api/{endpoint}", self.config.api_base);
        let request = self.authorized(self.http.post(&url), token).form(form);

        let response: ApiResponse = Self::send(&url, request).await?;
        if !response.json.errors.is_empty() {
            return Err(WatchError::Announcement {
                operation,
                reason: Value::Array(response.json.errors).to_string(),
            });
        }
        Ok(response.json)
    }
}

#[async_trait]
impl Announcer for RedditAnnouncer {
    #[instrument(skip(self, round), fields(round_id = %round.round_id))]
    async fn create_or_get(&self, round: &Round) -> Result<String> {
        let post = render(round, &self.round_label);
        let token = self.access_token().await?;

        if let Some(post_id) = self.find_post(&token, &post.title).await? {
            info!(%post_id, "found existing post");
            return Ok(post_id);
        }
        debug!(title = %post.title, "no existing post, submitting");

        let created = self
            .post_form(
                "submit",
                "create",
                &token,
                &[
                    ("sr", self.config.subreddit.as_str()),
                    ("title", post.title.as_str()),
                    ("kind", "self"),
                    ("text", post.body.as_str()),
                    ("api_type", "json"),
                ],
            )
            .await?;

        let post_id = created
            .data
            .and_then(|data| data.name)
            .ok_or_else(|| WatchError::Announcement {
                operation: "create",
                reason: "submit response carried no post id".to_string(),
            })?;
        info!(%post_id, "created post");
        Ok(post_id)
    }

    #[instrument(skip(self, round), fields(round_id = %round.round_id))]
    async fn update(&self, post_id: &str, round: &Round) -> Result<()> {
        let post = render(round, &self.round_label);
        let token = self.access_token().await?;
        self.post_form(
            "editusertext",
            "update",
            &token,
            &[
                ("thing_id", post_id),
                ("text", post.body.as_str()),
                ("api_type", "json"),
            ],
        )
        .await?;
        info!("updated post");
        Ok(())
    }
}
