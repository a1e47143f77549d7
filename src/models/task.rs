//! Task model matching the `tasks` and `task_reminders` tables.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ensure_present, new_id, now_timestamp, null_as_default};
use crate::errors::AppError;

/// Kanban column a task sits in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to-do" => Ok(TaskStatus::ToDo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            other => Err(AppError::Upstream(format!("Unknown task status {}", other))),
        }
    }
}

/// A unit of work, optionally attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub due_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assigned_to: String,
    /// Weak reference to an event, not resolved by this service
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

impl Task {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_present("title", &self.title)
    }
}

/// Query parameters for task listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Request body for creating a new task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl CreateTaskRequest {
    pub fn into_task(self) -> Task {
        let now = now_timestamp();
        Task {
            id: new_id(),
            title: self.title,
            description: self.description,
            status: self.status,
            due_date: self.due_date,
            assigned_to: self.assigned_to,
            event_id: self.event_id.filter(|id| !id.is_empty()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Request body for updating an existing task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// An empty string unlinks the task from its event
    #[serde(default)]
    pub event_id: Option<String>,
}

impl UpdateTaskRequest {
    /// Merge the provided fields over `existing`.
    pub fn apply_to(&self, existing: &Task) -> Task {
        Task {
            id: existing.id.clone(),
            title: self.title.clone().unwrap_or_else(|| existing.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            status: self.status.unwrap_or(existing.status),
            due_date: self
                .due_date
                .clone()
                .unwrap_or_else(|| existing.due_date.clone()),
            assigned_to: self
                .assigned_to
                .clone()
                .unwrap_or_else(|| existing.assigned_to.clone()),
            event_id: match self.event_id.as_deref() {
                Some("") => None,
                Some(event_id) => Some(event_id.to_string()),
                None => existing.event_id.clone(),
            },
            created_at: existing.created_at.clone(),
            updated_at: now_timestamp(),
        }
    }
}

/// Reminder attached to a task, one per task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskReminder {
    pub task_id: String,
    pub reminder_time: String,
    pub enabled: bool,
}

/// Request body for `PUT /api/tasks/{id}/reminder`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetReminderRequest {
    pub reminder_time: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SetReminderRequest {
    pub fn into_reminder(self, task_id: &str) -> Result<TaskReminder, AppError> {
        let reminder_time = chrono::DateTime::parse_from_rfc3339(self.reminder_time.trim())
            .map_err(|_| {
                AppError::Validation("reminder_time must be an RFC 3339 timestamp".to_string())
            })?;
        Ok(TaskReminder {
            task_id: task_id.to_string(),
            reminder_time: reminder_time.with_timezone(&chrono::Utc).to_rfc3339(),
            enabled: self.enabled,
        })
    }
}
