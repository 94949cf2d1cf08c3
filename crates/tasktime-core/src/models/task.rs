use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::datetime::optional_utc;
use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}' (expected low, medium or high)", other)),
        }
    }
}

/// Wire status. Anything the server sends other than `completed` is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("completed") {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        }
    }
}

/// Task as the API sends and receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    /// Minutes.
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default, with = "optional_utc")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, with = "optional_utc")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Task as the application sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: String,
    pub estimated_duration: Option<u32>,
    #[serde(default, with = "optional_utc")]
    pub deadline: Option<DateTime<Utc>>,
    pub completed: bool,
    #[serde(default, with = "optional_utc")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = ApiError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .ok_or_else(|| ApiError::Decode(format!("task '{}' has no id", record.title)))?;
        Ok(Task {
            id,
            title: record.title,
            description: record.description,
            priority: record.priority,
            category: record.category,
            estimated_duration: record.estimated_duration,
            deadline: record.deadline,
            completed: record.status == TaskStatus::Completed,
            completed_at: record.completed_at,
        })
    }
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        TaskRecord {
            id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            category: task.category.clone(),
            estimated_duration: task.estimated_duration,
            deadline: task.deadline,
            status: if task.completed {
                TaskStatus::Completed
            } else {
                TaskStatus::Pending
            },
            completed_at: task.completed_at,
        }
    }
}

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_future(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ApiError> {
    if deadline < now {
        return Err(ApiError::validation("Deadline cannot be in the past"));
    }
    Ok(())
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: String,
    pub estimated_duration: Option<u32>,
    #[serde(default, with = "optional_utc")]
    pub deadline: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ApiError> {
        require(&self.title, "Title")?;
        require(&self.category, "Category")?;
        let deadline = self
            .deadline
            .ok_or_else(|| ApiError::validation("Deadline is required"))?;
        require_future(deadline, now)
    }

    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: None,
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            priority: self.priority,
            category: self.category.trim().to_string(),
            estimated_duration: self.estimated_duration,
            deadline: self.deadline,
            status: TaskStatus::Pending,
            completed_at: None,
        }
    }
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub estimated_duration: Option<u32>,
    #[serde(default, with = "optional_utc")]
    pub deadline: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn complete() -> Self {
        Self {
            completed: Some(true),
            ..Self::default()
        }
    }

    /// Validate against `current` and produce the updated task.
    ///
    /// A task that becomes completed is stamped with `now`.
    pub fn apply(&self, current: &Task, now: DateTime<Utc>) -> Result<Task, ApiError> {
        if current.completed && self.completed == Some(false) {
            return Err(ApiError::validation("Completed tasks cannot be reopened"));
        }
        if let Some(ref title) = self.title {
            require(title, "Title")?;
        }
        if let Some(ref category) = self.category {
            require(category, "Category")?;
        }
        if let Some(deadline) = self.deadline {
            if current.deadline != Some(deadline) {
                require_future(deadline, now)?;
            }
        }

        let mut task = current.clone();
        if let Some(ref title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(ref description) = self.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(ref category) = self.category {
            task.category = category.trim().to_string();
        }
        if let Some(minutes) = self.estimated_duration {
            task.estimated_duration = Some(minutes);
        }
        if let Some(deadline) = self.deadline {
            task.deadline = Some(deadline);
        }
        if self.completed == Some(true) && !current.completed {
            task.completed = true;
            task.completed_at = Some(now);
        }
        Ok(task)
    }
}
