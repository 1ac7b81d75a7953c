use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::CloudTasksConfig;
use crate::error::{Result, WatchError};
use crate::scheduler::{CreateOutcome, DeleteOutcome, TaskRequest, TaskScheduler};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskBody<'a> {
    task: TaskBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskBody<'a> {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule_time: Option<String>,
    http_request: HttpRequestBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HttpRequestBody<'a> {
    http_method: &'static str,
    url: &'a str,
    headers: BTreeMap<&'a str, &'a str>,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Google Cloud Tasks queue, driven through the v2 REST API.
pub struct CloudTasksScheduler {
    http: reqwest::Client,
    api_base: String,
    queue_path: String,
    access_token: Option<String>,
    metadata_url: String,
}

impl CloudTasksScheduler {
    /// Create a scheduler with its own HTTP client.
    pub fn new(config: &CloudTasksConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| WatchError::Http {
                url: config.api_base.clone(),
                source: e,
            })?;
        Ok(Self::with_client(http, config))
    }

    /// Create a scheduler using the provided [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &CloudTasksConfig) -> Self {
        Self {
            http: client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            queue_path: format!(
                "projects/{}/locations/{}/queues/{}",
                config.project_id, config.location, config.queue_id
            ),
            access_token: config.access_token.clone(),
            metadata_url: config.metadata_url.clone(),
        }
    }

    fn task_path(&self, name: &str) -> String {
        format!("{}/tasks/{name}", self.queue_path)
    }

    async fn token(&self) -> Result<String> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let response = self
            .http
            .get(&self.metadata_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| WatchError::Http {
                url: self.metadata_url.clone(),
                source: e,
            })?;
        if !response.status().is_success() {
            return Err(WatchError::UnexpectedStatus {
                url: self.metadata_url.clone(),
                status: response.status(),
            });
        }
        let token: MetadataToken = response.json().await.map_err(|e| WatchError::Http {
            url: self.metadata_url.clone(),
            source: e,
        })?;
        Ok(token.access_token)
    }

    async fn rejection(
        response: reqwest::Response,
        operation: &'static str,
        name: &str,
    ) -> WatchError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        WatchError::Scheduler {
            operation,
            name: name.to_string(),
            reason: format!("{status}: {body}"),
        }
    }
}

#[async_trait]
impl TaskScheduler for CloudTasksScheduler {
    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let url = format!("{}/v2/{}", self.api_base, self.task_path(name));
        let token = self.token().await?;
        let response = self
            .http
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| WatchError::Http {
                url: url.clone(),
                source: e,
            })?;

        match response.status() {
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            _ => Err(Self::rejection(response, "delete", name).await),
        }
    }

    #[instrument(skip(self, task), fields(name = %task.name, run_at = ?task.run_at))]
    async fn create(&self, task: &TaskRequest) -> Result<CreateOutcome> {
        let url = format!("{}/v2/{}/tasks", self.api_base, self.queue_path);
        let body = CreateTaskBody {
            task: TaskBody {
                name: self.task_path(&task.name),
                schedule_time: task.run_at.map(|t| t.to_rfc3339()),
                http_request: HttpRequestBody {
                    http_method: "POST",
                    url: &task.url,
                    headers: task
                        .headers
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .collect(),
                },
            },
        };

        let token = self.token().await?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WatchError::Http {
                url: url.clone(),
                source: e,
            })?;

        match response.status() {
            status if status.is_success() => {
                debug!("task created");
                Ok(CreateOutcome::Created)
            }
            StatusCode::CONFLICT => Ok(CreateOutcome::AlreadyExists),
            _ => Err(Self::rejection(response, "create", &task.name).await),
        }
    }
}
