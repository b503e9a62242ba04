use chrono::{DateTime, Utc};
use orbit_core::{TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::module::Module;

/// Urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Normal urgency.
    Medium,
    /// Needs attention first.
    High,
}

impl TaskPriority {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Progress status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Open,
    /// Being worked on.
    InProgress,
    /// Completed.
    Done,
}

/// Follow-up activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Record identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Short title.
    pub title: String,
    /// Details.
    #[serde(default)]
    pub description: String,
    /// Due date.
    #[serde(default)]
    pub due_date: String,
    /// Urgency.
    pub priority: TaskPriority,
    /// Progress status.
    pub status: TaskStatus,
    /// Assignee.
    #[serde(default)]
    pub assigned_to: String,
    /// Related record reference.
    #[serde(default)]
    pub related_to: String,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

domain_record!(Task, Module::Activities, "tasks", |task| [
    task.title.as_str(),
    task.description.as_str(),
]);
