use std::path::PathBuf;

/// Coarse classification of failures, used to decide how loudly to report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Network or remote-service failure; redelivery of the trigger retries it.
    TransientExternal,
    /// One of the merge feeds produced nothing usable.
    PartialData,
    /// A stored or received document is structurally invalid.
    MalformedInput,
    /// The process is misconfigured.
    Configuration,
}

/// All errors that can occur while tracking a round.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The provider answered but flagged the request as failed.
    #[error("provider rejected request to {url}: {message}")]
    Provider { url: String, message: String },

    /// A response or document could not be decoded as JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem access failed.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// At least one of the baseline, live or results feeds is missing.
    #[error("cannot consolidate round {round_id}: missing {missing} feed")]
    IncompleteFeeds {
        round_id: String,
        missing: &'static str,
    },

    /// The pointer document exists but is unusable.
    #[error("malformed round pointer: {reason}")]
    MalformedPointer { reason: String },

    /// A persisted round snapshot could not be read back.
    #[error("malformed snapshot at {path}: {reason}")]
    MalformedSnapshot { path: String, reason: String },

    /// The task queue refused a request.
    #[error("scheduler rejected {operation} of task {name}: {reason}")]
    Scheduler {
        operation: &'static str,
        name: String,
        reason: String,
    },

    /// The posting backend refused a request.
    #[error("announcement {operation} failed: {reason}")]
    Announcement {
        operation: &'static str,
        reason: String,
    },

    /// A required setting is missing or invalid.
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

impl WatchError {
    /// Classify the error for reporting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WatchError::Http { .. }
            | WatchError::UnexpectedStatus { .. }
            | WatchError::Provider { .. }
            | WatchError::Io { .. }
            | WatchError::Scheduler { .. }
            | WatchError::Announcement { .. } => ErrorCategory::TransientExternal,
            WatchError::IncompleteFeeds { .. } => ErrorCategory::PartialData,
            WatchError::Json(_)
            | WatchError::MalformedPointer { .. }
            | WatchError::MalformedSnapshot { .. } => ErrorCategory::MalformedInput,
            WatchError::Config { .. } => ErrorCategory::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
