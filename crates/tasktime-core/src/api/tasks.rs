//! The operations the UI layer calls: five task operations and `suggest`.
//!
//! Validation happens here, before anything reaches the pipeline, so a
//! rejected input never touches the network or the cache.

use chrono::{DateTime, TimeZone, Utc};
use tracing::info;

use super::client::CachingClient;
use super::request::Request;
use super::ApiError;
use crate::models::{NewTask, Priority, SuggestionRequest, Task, TaskPatch, TaskRecord, TimeSuggestion};
use crate::suggestions::SuggestionEngine;

const TASKS_PATH: &str = "/tasks";

fn task_path(id: i64) -> String {
    format!("{}/{}", TASKS_PATH, id)
}

fn to_body(record: &TaskRecord) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(record).map_err(|e| ApiError::Decode(e.to_string()))
}

pub struct TaskService {
    client: CachingClient,
    suggestions: SuggestionEngine,
}

impl TaskService {
    pub fn new(client: CachingClient, suggestions: SuggestionEngine) -> Self {
        Self {
            client,
            suggestions,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.client.cache().now_ms())
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let records: Vec<TaskRecord> = self.client.fetch(Request::get(TASKS_PATH)).await?;
        records.into_iter().map(Task::try_from).collect()
    }

    pub async fn get_task(&self, id: i64) -> Result<Task, ApiError> {
        let record: TaskRecord = self.client.fetch(Request::get(task_path(id))).await?;
        Task::try_from(record)
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        task.validate(self.now())?;
        let body = to_body(&task.to_record())?;
        let record: TaskRecord = self.client.fetch(Request::post(TASKS_PATH, body)).await?;
        let created = Task::try_from(record)?;
        info!(id = created.id, "Task created");
        Ok(created)
    }

    /// Apply `patch` to `current` and send the full task back.
    pub async fn update_task(&self, current: &Task, patch: &TaskPatch) -> Result<Task, ApiError> {
        let updated = patch.apply(current, self.now())?;
        let body = to_body(&TaskRecord::from(&updated))?;
        let record: TaskRecord = self
            .client
            .fetch(Request::put(task_path(current.id), body))
            .await?;
        Task::try_from(record)
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        self.client.execute(Request::delete(task_path(id))).await?;
        info!(id = id, "Task deleted");
        Ok(())
    }

    /// Ranked time windows for a task; never fails.
    pub async fn suggest(
        &self,
        title: &str,
        category: &str,
        priority: Priority,
        estimated_duration: u32,
    ) -> Vec<TimeSuggestion> {
        let request = SuggestionRequest::new(title, category, priority, estimated_duration);
        self.suggestions.suggest(&request).await
    }
}
