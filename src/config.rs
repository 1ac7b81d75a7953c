//! Runtime configuration, read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, WatchError};

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub competition: CompetitionConfig,
    pub cadence: CadenceConfig,
    pub service: ServiceConfig,
    /// Which provider feeds the round snapshot.
    pub provider: FeedProvider,
    pub live_score: LiveScoreConfig,
    pub api_football: ApiFootballConfig,
    pub reddit: RedditConfig,
    pub cloud_tasks: CloudTasksConfig,
}

/// Which competition is tracked and how it is labelled.
#[derive(Debug, Clone)]
pub struct CompetitionConfig {
    pub competition_id: u32,
    pub league_slug: String,
    pub season_id: String,
    pub competition_name: String,
    /// Word used before the round number in announcement titles.
    pub round_label: String,
}

impl CompetitionConfig {
    /// Storage path of a round snapshot.
    pub fn document_path(&self, round_id: &str) -> String {
        format!(
            "leagues/{}/seasons/{}/rounds/{}",
            self.league_slug, self.season_id, round_id
        )
    }
}

/// Timing knobs for polling and scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceConfig {
    /// How long before kickoff the watch thread is opened.
    pub lead_window: Duration,
    pub live_poll_interval: Duration,
    /// Re-poll delay when round progress cannot be classified.
    pub unknown_retry: Duration,
    /// Re-check delay when no round could be discovered.
    pub idle_recheck: Duration,
    pub discovery_lookahead_days: u32,
    pub results_window_days: u32,
    /// Resolution of scheduled task names.
    pub task_bucket: Duration,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            lead_window: Duration::from_secs(60 * 60),
            live_poll_interval: Duration::from_secs(60),
            unknown_retry: Duration::from_secs(5 * 60),
            idle_recheck: Duration::from_secs(24 * 60 * 60),
            discovery_lookahead_days: 30,
            results_window_days: 7,
            task_bucket: Duration::from_secs(60),
        }
    }
}

/// Inbound trigger and persistence settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: SocketAddr,
    /// Shared secret expected in the `X-API-Key` header.
    pub api_key: String,
    /// URL the task queue calls back to trigger the next run.
    pub callback_url: String,
    pub store_root: PathBuf,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Sports-data provider behind the match feeds.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FeedProvider {
    #[default]
    #[strum(to_string = "live_score", serialize = "livescore")]
    LiveScore,
    #[strum(to_string = "api_football", serialize = "apifootball")]
    ApiFootball,
}

/// livescore-api.com credentials and endpoint.
#[derive(Debug, Clone)]
pub struct LiveScoreConfig {
    pub base_url: String,
    pub key: String,
    pub secret: String,
    pub request_timeout: Duration,
}

/// API-Football (api-sports.io v3) credentials and competition season.
#[derive(Debug, Clone)]
pub struct ApiFootballConfig {
    pub base_url: String,
    pub key: String,
    /// Season year the league is queried for, e.g. `2024`.
    pub season: String,
    /// Text before the round number in the provider's round names.
    pub round_prefix: String,
    pub request_timeout: Duration,
}

/// Reddit script-app credentials and the subreddit that gets the watch thread.
#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub user_agent: String,
    pub subreddit: String,
    pub api_base: String,
    pub auth_base: String,
    pub request_timeout: Duration,
}

/// Cloud Tasks queue that delivers the next trigger.
#[derive(Debug, Clone)]
pub struct CloudTasksConfig {
    pub project_id: String,
    pub location: String,
    pub queue_id: String,
    pub api_base: String,
    /// Static bearer token; when absent the metadata server is asked.
    pub access_token: Option<String>,
    pub metadata_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let competition = CompetitionConfig {
            competition_id: parsed("ROUND_WATCH_COMPETITION_ID")?
                .unwrap_or(defaults.competition.competition_id),
            league_slug: var("ROUND_WATCH_LEAGUE").unwrap_or(defaults.competition.league_slug),
            season_id: var("ROUND_WATCH_SEASON").unwrap_or(defaults.competition.season_id),
            competition_name: var("ROUND_WATCH_COMPETITION_NAME")
                .unwrap_or(defaults.competition.competition_name),
            round_label: var("ROUND_WATCH_ROUND_LABEL").unwrap_or(defaults.competition.round_label),
        };

        let cadence = CadenceConfig {
            lead_window: secs("ROUND_WATCH_LEAD_WINDOW_SECS")?
                .unwrap_or(defaults.cadence.lead_window),
            live_poll_interval: secs("ROUND_WATCH_LIVE_POLL_SECS")?
                .unwrap_or(defaults.cadence.live_poll_interval),
            unknown_retry: secs("ROUND_WATCH_UNKNOWN_RETRY_SECS")?
                .unwrap_or(defaults.cadence.unknown_retry),
            idle_recheck: secs("ROUND_WATCH_IDLE_RECHECK_SECS")?
                .unwrap_or(defaults.cadence.idle_recheck),
            discovery_lookahead_days: parsed("ROUND_WATCH_LOOKAHEAD_DAYS")?
                .unwrap_or(defaults.cadence.discovery_lookahead_days),
            results_window_days: parsed("ROUND_WATCH_RESULTS_WINDOW_DAYS")?
                .unwrap_or(defaults.cadence.results_window_days),
            task_bucket: secs("ROUND_WATCH_TASK_BUCKET_SECS")?
                .unwrap_or(defaults.cadence.task_bucket),
        };

        let port: u16 = parsed("PORT")?.unwrap_or(8080);
        let service = ServiceConfig {
            bind_address: SocketAddr::from(([0, 0, 0, 0], port)),
            api_key: var("INTERNAL_API_KEY").unwrap_or_default(),
            callback_url: var("CLOUD_RUN_SERVICE_URL").unwrap_or_default(),
            store_root: var("ROUND_WATCH_STORE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.service.store_root),
            log_format: parsed("ROUND_WATCH_LOG_FORMAT")?.unwrap_or(defaults.service.log_format),
        };

        let provider = parsed("ROUND_WATCH_PROVIDER")?.unwrap_or(defaults.provider);

        let live_score = LiveScoreConfig {
            base_url: var("LIVE_SCORE_API_BASE").unwrap_or(defaults.live_score.base_url),
            key: var("LIVE_SCORE_API_KEY").unwrap_or_default(),
            secret: var("LIVE_SCORE_API_SECRET").unwrap_or_default(),
            request_timeout: defaults.live_score.request_timeout,
        };

        let api_football = ApiFootballConfig {
            base_url: var("API_FOOTBALL_API_BASE").unwrap_or(defaults.api_football.base_url),
            key: var("API_FOOTBALL_API_KEY").unwrap_or_default(),
            season: var("API_FOOTBALL_SEASON").unwrap_or_default(),
            round_prefix: var("API_FOOTBALL_ROUND_PREFIX")
                .unwrap_or(defaults.api_football.round_prefix),
            request_timeout: defaults.api_football.request_timeout,
        };

        let reddit = RedditConfig {
            client_id: var("REDDIT_CLIENT_ID").unwrap_or_default(),
            client_secret: var("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            refresh_token: var("REDDIT_REFRESH_TOKEN").unwrap_or_default(),
            user_agent: var("REDDIT_USER_AGENT").unwrap_or(defaults.reddit.user_agent),
            subreddit: var("TARGET_SUBREDDIT").unwrap_or_default(),
            api_base: var("REDDIT_API_BASE").unwrap_or(defaults.reddit.api_base),
            auth_base: var("REDDIT_AUTH_BASE").unwrap_or(defaults.reddit.auth_base),
            request_timeout: defaults.reddit.request_timeout,
        };

        let cloud_tasks = CloudTasksConfig {
            project_id: var("GCP_PROJECT_ID").unwrap_or_default(),
            location: var("GCP_LOCATION").unwrap_or_default(),
            queue_id: var("GCP_TASKS_QUEUE_ID").unwrap_or_default(),
            api_base: var("GCP_TASKS_API_BASE").unwrap_or(defaults.cloud_tasks.api_base),
            access_token: var("GCP_ACCESS_TOKEN"),
            metadata_url: defaults.cloud_tasks.metadata_url,
        };

        Ok(Self {
            competition,
            cadence,
            service,
            provider,
            live_score,
            api_football,
            reddit,
            cloud_tasks,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let cadence = &self.cadence;
        for (key, value) in [
            ("ROUND_WATCH_LIVE_POLL_SECS", cadence.live_poll_interval),
            ("ROUND_WATCH_UNKNOWN_RETRY_SECS", cadence.unknown_retry),
            ("ROUND_WATCH_IDLE_RECHECK_SECS", cadence.idle_recheck),
            ("ROUND_WATCH_TASK_BUCKET_SECS", cadence.task_bucket),
        ] {
            if value.is_zero() {
                return Err(invalid(key, "must be greater than 0"));
            }
        }
        if cadence.discovery_lookahead_days == 0 {
            return Err(invalid("ROUND_WATCH_LOOKAHEAD_DAYS", "must be greater than 0"));
        }

        let provider_keys = match self.provider {
            FeedProvider::LiveScore => [
                ("LIVE_SCORE_API_KEY", &self.live_score.key),
                ("LIVE_SCORE_API_SECRET", &self.live_score.secret),
            ],
            FeedProvider::ApiFootball => [
                ("API_FOOTBALL_API_KEY", &self.api_football.key),
                ("API_FOOTBALL_SEASON", &self.api_football.season),
            ],
        };
        for (key, value) in provider_keys.into_iter().chain([
            ("INTERNAL_API_KEY", &self.service.api_key),
            ("CLOUD_RUN_SERVICE_URL", &self.service.callback_url),
            ("TARGET_SUBREDDIT", &self.reddit.subreddit),
            ("GCP_PROJECT_ID", &self.cloud_tasks.project_id),
            ("GCP_LOCATION", &self.cloud_tasks.location),
            ("GCP_TASKS_QUEUE_ID", &self.cloud_tasks.queue_id),
        ]) {
            if value.trim().is_empty() {
                return Err(invalid(key, "must be set"));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            competition: CompetitionConfig {
                competition_id: 1,
                league_slug: String::from("bundesliga"),
                season_id: String::from("season_2024_2025"),
                competition_name: String::from("Super League"),
                round_label: String::from("Round"),
            },
            cadence: CadenceConfig::default(),
            service: ServiceConfig {
                bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
                api_key: String::new(),
                callback_url: String::new(),
                store_root: PathBuf::from("data"),
                log_format: LogFormat::Text,
            },
            provider: FeedProvider::LiveScore,
            live_score: LiveScoreConfig {
                base_url: String::from("https://livescore-api.com/api-client"),
                key: String::new(),
                secret: String::new(),
                request_timeout: Duration::from_secs(15),
            },
            api_football: ApiFootballConfig {
                base_url: String::from("https://v3.football.api-sports.io"),
                key: String::new(),
                season: String::new(),
                round_prefix: String::from("Regular Season - "),
                request_timeout: Duration::from_secs(20),
            },
            reddit: RedditConfig {
                client_id: String::new(),
                client_secret: String::new(),
                refresh_token: String::new(),
                user_agent: format!("round-watch/{}", env!("CARGO_PKG_VERSION")),
                subreddit: String::new(),
                api_base: String::from("https://oauth.reddit.com"),
                auth_base: String::from("https://www.reddit.com"),
                request_timeout: Duration::from_secs(30),
            },
            cloud_tasks: CloudTasksConfig {
                project_id: String::new(),
                location: String::new(),
                queue_id: String::new(),
                api_base: String::from("https://cloudtasks.googleapis.com"),
                access_token: None,
                metadata_url: String::from(
                    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token",
                ),
            },
        }
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| invalid(key, e)))
        .transpose()
}

fn secs(key: &'static str) -> Result<Option<Duration>> {
    Ok(parsed::<u64>(key)?.map(Duration::from_secs))
}

fn invalid(key: &'static str, reason: impl std::fmt::Display) -> WatchError {
    WatchError::Config {
        key,
        reason: reason.to_string(),
    }
}
