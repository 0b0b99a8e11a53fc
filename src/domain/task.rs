//! Task domain model
//!
//! A task is a unit of work assigned to one person, occupying a span of
//! business days. Its `end_date` is always derived from `start_date` and
//! `duration_days` by the allocation engine, never set directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::TaskId;

/// Priority rank used for tasks without an explicit priority (sorts last)
pub const UNRANKED_PRIORITY: u32 = 999;

/// Status of a task on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    Doing,
    AwaitingApproval,
    Qa,
    Approved,
    Blocked,
    Urgent,
}

impl TaskStatus {
    /// All statuses in board-column order
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::Todo,
        TaskStatus::Doing,
        TaskStatus::AwaitingApproval,
        TaskStatus::Qa,
        TaskStatus::Approved,
        TaskStatus::Blocked,
        TaskStatus::Urgent,
    ];

    /// Returns true if this status represents delivered work
    pub fn is_approved(&self) -> bool {
        matches!(self, TaskStatus::Approved)
    }

    /// Returns true for the states owned by the urgency protocol.
    ///
    /// A frozen task can only leave its state through
    /// `resolve_urgent`, never through a plain status move.
    pub fn is_frozen(&self) -> bool {
        matches!(self, TaskStatus::Blocked | TaskStatus::Urgent)
    }

    /// Returns a display label for the status
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::AwaitingApproval => "awaiting_approval",
            TaskStatus::Qa => "qa",
            TaskStatus::Approved => "approved",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "doing" => Ok(TaskStatus::Doing),
            "awaiting_approval" => Ok(TaskStatus::AwaitingApproval),
            "qa" => Ok(TaskStatus::Qa),
            "approved" => Ok(TaskStatus::Approved),
            "blocked" => Ok(TaskStatus::Blocked),
            "urgent" => Ok(TaskStatus::Urgent),
            other => Err(format!(
                "unknown status '{}' (expected one of: todo, doing, awaiting_approval, qa, approved, blocked, urgent)",
                other
            )),
        }
    }
}

/// A scheduled task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned at creation
    pub id: TaskId,

    /// Human-readable name
    pub name: String,

    /// First day of the task's span
    pub start_date: NaiveDate,

    /// Last day of the task's span; derived from `start_date` and
    /// `duration_days`, re-derived on every mutation that touches either
    pub end_date: NaiveDate,

    /// Business days the task occupies (always positive in stored tasks)
    pub duration_days: u32,

    /// Person responsible
    pub assignee: String,

    /// Manager accountable for the task
    pub manager: String,

    /// Current board status
    pub status: TaskStatus,

    /// Explicit priority; lower = more urgent, absent ranks last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    /// Urgency flag, kept in sync with `status == Urgent` by the registry
    #[serde(default)]
    pub urgent: bool,

    /// Parallel tasks are exempt from sequential slot/conflict logic
    #[serde(default)]
    pub parallel: bool,

    /// Optional reference URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Sort rank for priority ordering: explicit priority, or
    /// [`UNRANKED_PRIORITY`] when absent
    pub fn priority_rank(&self) -> u32 {
        self.priority.unwrap_or(UNRANKED_PRIORITY)
    }
}

/// Validated input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    pub name: String,
    pub assignee: String,
    pub manager: String,
    pub duration_days: u32,

    /// Preferred start; for non-parallel tasks the registry may push this
    /// to the assignee's next free slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Partial update for a task; `None` fields are left untouched.
///
/// Status and the urgency flag are deliberately absent; they move only
/// through the registry's status/urgency operations.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub assignee: Option<String>,
    pub manager: Option<String>,
    pub duration_days: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub priority: Option<u32>,
    pub parallel: Option<bool>,
    pub link: Option<String>,
}

impl TaskPatch {
    /// Returns true if the patch carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.assignee.is_none()
            && self.manager.is_none()
            && self.duration_days.is_none()
            && self.start_date.is_none()
            && self.priority.is_none()
            && self.parallel.is_none()
            && self.link.is_none()
    }
}
