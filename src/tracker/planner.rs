use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::scheduler::{CreateOutcome, DeleteOutcome, TaskRequest, TaskScheduler};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Deterministic task name for a run of `round_id` at `run_at`.
///
/// `run_at` is floored to `bucket`, so every run time inside one bucket maps
/// to the same name.
pub fn task_name(round_id: Option<&str>, run_at: DateTime<Utc>, bucket: Duration) -> String {
    let bucket = i64::try_from(bucket.as_secs()).unwrap_or(i64::MAX).max(1);
    let secs = run_at.timestamp();
    let floored = Utc
        .timestamp_opt(secs - secs.rem_euclid(bucket), 0)
        .single()
        .unwrap_or(run_at);
    let stamp = floored.format("%Y%m%d%H%M");

    let raw = match round_id {
        Some(round_id) => format!("round-{round_id}-{stamp}"),
        None => format!("discovery-{stamp}"),
    };
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Suffix for the second attempt when a just-deleted name is still reserved.
const RESERVED_SUFFIX: &str = "r";

/// Ask the queue to call `callback_url` again at `next_run_at`.
///
/// Nothing is scheduled when `next_run_at` is `None`. Any task already queued
/// under the same name is removed first. A create that reports the name as
/// taken counts as scheduled, unless this call just deleted that name: the
/// queue then still reserves it with no live task behind it, so the run is
/// created once more under a suffixed name. Returns the last task name used.
#[instrument(skip(scheduler, callback_url, api_key))]
pub async fn schedule(
    scheduler: &dyn TaskScheduler,
    next_run_at: Option<DateTime<Utc>>,
    callback_url: &str,
    api_key: &str,
    round_id: Option<&str>,
    bucket: Duration,
) -> Result<Option<String>> {
    let Some(run_at) = next_run_at else {
        debug!("no next run, nothing to schedule");
        return Ok(None);
    };

    let name = task_name(round_id, run_at, bucket);

    let deleted = scheduler.delete(&name).await?;
    match deleted {
        DeleteOutcome::Deleted => debug!(%name, "removed previously scheduled task"),
        DeleteOutcome::NotFound => debug!(%name, "no previous task to remove"),
    }

    let mut task = TaskRequest {
        name: name.clone(),
        url: callback_url.to_string(),
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            (API_KEY_HEADER.to_string(), api_key.to_string()),
        ],
        run_at: Some(run_at),
    };

    let created = scheduler.create(&task).await?;
    match (deleted, created) {
        (_, CreateOutcome::Created) => info!(%name, %run_at, "scheduled next run"),
        (DeleteOutcome::NotFound, CreateOutcome::AlreadyExists) => {
            info!(%name, %run_at, "next run already scheduled")
        }
        (DeleteOutcome::Deleted, CreateOutcome::AlreadyExists) => {
            warn!(%name, "deleted name still reserved, scheduling under a new name");
            task.name = format!("{name}-{RESERVED_SUFFIX}");
            match scheduler.create(&task).await? {
                CreateOutcome::Created => {
                    info!(name = %task.name, %run_at, "scheduled next run")
                }
                CreateOutcome::AlreadyExists => {
                    info!(name = %task.name, %run_at, "next run already scheduled")
                }
            }
        }
    }
    Ok(Some(task.name))
}
