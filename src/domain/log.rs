//! Audit log entries
//!
//! Every registry mutation appends an immutable [`LogEntry`]; entries are
//! never updated or deleted afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{LogId, TaskId};

/// What a log entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    UrgentSet,
    UrgentResolved,
    Reallocated,
    Blocked,
    Unblocked,
}

impl LogAction {
    /// Returns a display label for the action
    pub fn label(&self) -> &'static str {
        match self {
            LogAction::Created => "created",
            LogAction::Updated => "updated",
            LogAction::Deleted => "deleted",
            LogAction::StatusChanged => "status_changed",
            LogAction::UrgentSet => "urgent_set",
            LogAction::UrgentResolved => "urgent_resolved",
            LogAction::Reallocated => "reallocated",
            LogAction::Blocked => "blocked",
            LogAction::Unblocked => "unblocked",
        }
    }
}

/// An immutable audit record of one registry mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier
    pub id: LogId,

    /// The task the entry concerns; `None` for collection-wide actions
    /// such as a reallocation sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,

    /// What happened
    pub action: LogAction,

    /// Human-readable description
    pub description: String,

    /// When it happened
    pub timestamp: DateTime<Utc>,

    /// Optional structured snapshot (changed fields, counts, old/new values)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl LogEntry {
    /// Creates an entry about a specific task
    pub fn for_task(
        task_id: TaskId,
        action: LogAction,
        description: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        let description = description.into();
        let timestamp = Utc::now();
        Self {
            id: LogId::new(&description, timestamp),
            task_id: Some(task_id),
            action,
            description,
            timestamp,
            metadata,
        }
    }

    /// Creates a collection-wide entry (no single task)
    pub fn system(
        action: LogAction,
        description: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        let description = description.into();
        let timestamp = Utc::now();
        Self {
            id: LogId::new(&description, timestamp),
            task_id: None,
            action,
            description,
            timestamp,
            metadata,
        }
    }
}
