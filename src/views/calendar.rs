//! Calendar projection
//!
//! Maps tasks to all-day visual events spanning `start_date..end_date`.
//! Pure derivation over a task snapshot; nothing here mutates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Task, TaskId, TaskStatus};

/// A visual calendar event derived from one task
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub id: TaskId,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub all_day: bool,
    pub color: &'static str,
    pub assignee: String,
    pub status: TaskStatus,
    pub urgent: bool,
    pub parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One event per task
pub fn events(tasks: &[Task]) -> Vec<CalendarEvent> {
    tasks
        .iter()
        .map(|task| CalendarEvent {
            id: task.id.clone(),
            title: task.name.clone(),
            start: task.start_date,
            end: task.end_date,
            all_day: true,
            color: event_color(task.priority, task.status, task.urgent),
            assignee: task.assignee.clone(),
            status: task.status,
            urgent: task.urgent,
            parallel: task.parallel,
            description: task.link.clone(),
        })
        .collect()
}

/// Picks an event color with a fixed precedence: the urgent flag wins,
/// then status-specific colors, then the priority band, then the default.
pub fn event_color(priority: Option<u32>, status: TaskStatus, urgent: bool) -> &'static str {
    if urgent {
        return "#ef4444"; // red
    }

    match status {
        TaskStatus::Approved => return "#10b981", // green
        TaskStatus::Urgent => return "#f97316",   // orange
        TaskStatus::Blocked => return "#6b7280",  // gray
        TaskStatus::Todo | TaskStatus::Doing | TaskStatus::AwaitingApproval | TaskStatus::Qa => {}
    }

    if let Some(priority) = priority {
        if priority <= 2 {
            return "#dc2626"; // dark red
        }
        if priority <= 4 {
            return "#f97316"; // orange
        }
        return "#eab308"; // yellow
    }

    "#3b82f6" // default blue
}

/// Groups events by their start date
pub fn events_by_date(tasks: &[Task]) -> BTreeMap<NaiveDate, Vec<CalendarEvent>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events(tasks) {
        grouped.entry(event.start).or_default().push(event);
    }
    grouped
}

/// Events starting within the inclusive range `[from, to]`
pub fn events_in_range(tasks: &[Task], from: NaiveDate, to: NaiveDate) -> Vec<CalendarEvent> {
    events(tasks)
        .into_iter()
        .filter(|e| e.start >= from && e.start <= to)
        .collect()
}
