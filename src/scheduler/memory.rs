use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, WatchError};
use crate::scheduler::{CreateOutcome, DeleteOutcome, TaskRequest, TaskScheduler};

/// In-process queue for tests and dry runs. Nothing is ever delivered.
#[derive(Debug, Default)]
pub struct MemoryScheduler {
    tasks: Mutex<BTreeMap<String, TaskRequest>>,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently queued tasks, ordered by name.
    pub fn tasks(&self) -> Vec<TaskRequest> {
        self.tasks
            .lock()
            .map(|tasks| tasks.values().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(
        &self,
        operation: &'static str,
        name: &str,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, TaskRequest>>> {
        self.tasks.lock().map_err(|e| WatchError::Scheduler {
            operation,
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl TaskScheduler for MemoryScheduler {
    async fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let mut tasks = self.lock("delete", name)?;
        Ok(match tasks.remove(name) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn create(&self, task: &TaskRequest) -> Result<CreateOutcome> {
        let mut tasks = self.lock("create", &task.name)?;
        if tasks.contains_key(&task.name) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        tasks.insert(task.name.clone(), task.clone());
        Ok(CreateOutcome::Created)
    }
}
