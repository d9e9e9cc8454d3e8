//! Task domain model
//!
//! Tasks are units of work that may depend on other tasks. A dependency
//! names a prerequisite that must be completed before the task may start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::TaskId;

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("Cannot {action} task {id}: status is {status}")]
    InvalidTransition {
        id: TaskId,
        action: &'static str,
        status: TaskStatus,
    },

    #[error("Unknown task status '{0}' (expected not_started, in_progress, in_review or completed)")]
    UnknownStatus(String),
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "not-started")]
    NotStarted,
    #[serde(alias = "in-progress")]
    InProgress,
    #[serde(alias = "in-review")]
    InReview,
    Completed,
}

impl TaskStatus {
    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Returns true if this task is not yet started
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::NotStarted)
    }

    /// Returns true if this task is currently being worked on or reviewed
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::InReview)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Completed => "completed",
        }
    }

    /// Checkbox-style marker for text output
    pub fn marker(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "[ ]",
            TaskStatus::InProgress => "[~]",
            TaskStatus::InReview => "[?]",
            TaskStatus::Completed => "[x]",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" => Ok(TaskStatus::NotStarted),
            "in_progress" => Ok(TaskStatus::InProgress),
            "in_review" => Ok(TaskStatus::InReview),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(TaskError::UnknownStatus(s.to_string())),
        }
    }
}

/// A unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Prerequisites that must be completed before this task may start
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the task was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    /// When the task was completed (if completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new task with the given ID and title
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            status: TaskStatus::NotStarted,
            dependencies: Vec::new(),
            description: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Returns true if `task_id` is a direct prerequisite of this task
    pub fn depends_on(&self, task_id: &TaskId) -> bool {
        self.dependencies.contains(task_id)
    }

    /// Transitions not_started -> in_progress
    ///
    /// Does not consult prerequisites; callers check startability first.
    pub fn start(&mut self) -> Result<(), TaskError> {
        self.transition("start", TaskStatus::NotStarted, TaskStatus::InProgress)
    }

    /// Transitions in_progress -> in_review
    pub fn submit_for_review(&mut self) -> Result<(), TaskError> {
        self.transition("review", TaskStatus::InProgress, TaskStatus::InReview)
    }

    /// Transitions any open status to completed
    pub fn complete(&mut self) -> Result<(), TaskError> {
        if self.status.is_complete() {
            return Err(self.invalid("complete"));
        }
        let now = Utc::now();
        self.status = TaskStatus::Completed;
        self.updated_at = now;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Sends a completed task back to not_started, or a reviewed task back to in_progress
    pub fn reopen(&mut self) -> Result<(), TaskError> {
        let next = match self.status {
            TaskStatus::Completed => TaskStatus::NotStarted,
            TaskStatus::InReview => TaskStatus::InProgress,
            _ => return Err(self.invalid("reopen")),
        };
        self.status = next;
        self.updated_at = Utc::now();
        self.completed_at = None;
        Ok(())
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<(), TaskError> {
        if self.status != from {
            return Err(self.invalid(action));
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> TaskError {
        TaskError::InvalidTransition {
            id: self.id.clone(),
            action,
            status: self.status,
        }
    }

    /// Adds a prerequisite; returns false if it was already present
    ///
    /// Acyclicity is not checked here. Go through
    /// [`DependencyGraph::validate_new_dependency`](super::DependencyGraph::validate_new_dependency).
    pub fn add_dependency(&mut self, task_id: TaskId) -> bool {
        if self.dependencies.contains(&task_id) {
            return false;
        }
        self.dependencies.push(task_id);
        self.updated_at = Utc::now();
        true
    }

    /// Removes a prerequisite; returns false if it was not present
    pub fn remove_dependency(&mut self, task_id: &TaskId) -> bool {
        let len_before = self.dependencies.len();
        self.dependencies.retain(|d| d != task_id);
        let removed = self.dependencies.len() != len_before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Sets the description
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
        self.updated_at = Utc::now();
    }
}
