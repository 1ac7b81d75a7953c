//! Delayed-callback task queues.

mod cloud_tasks;
mod memory;

pub use cloud_tasks::CloudTasksScheduler;
pub use memory::MemoryScheduler;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// A named HTTP callback to be delivered at or after `run_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRequest {
    pub name: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// `None` asks the queue to deliver as soon as possible.
    pub run_at: Option<DateTime<Utc>>,
}

/// Result of removing a task by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Result of creating a named task. `AlreadyExists` means the queue still
/// holds the name, live or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// A queue that delivers named callbacks, deduplicated by name.
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn delete(&self, name: &str) -> Result<DeleteOutcome>;

    async fn create(&self, task: &TaskRequest) -> Result<CreateOutcome>;
}
