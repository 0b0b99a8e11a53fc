//! Task registry
//!
//! The registry owns the authoritative in-memory task collection and the
//! append-only audit log, and is the only mutator of either. It drives the
//! urgency-preemption state machine, delegates date computation to
//! [`crate::domain::allocation`], and persists through an injected
//! [`BlobStore`] after every mutation.
//!
//! Persistence is best-effort: the in-memory write is already visible when
//! the save runs, so a failing save never rolls an operation back; it is
//! recorded in [`Registry::last_error`] and the operation still succeeds.

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::allocation::{
    calculate_end_date, find_conflicts, next_available_slot, sequential_reallocate,
};
use crate::domain::{LogAction, LogEntry, Task, TaskId, TaskInput, TaskPatch, TaskStatus};
use crate::storage::BlobStore;

const TASKS_KEY: &str = "tasks";
const LOGS_KEY: &str = "logs";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Authoritative owner of the task collection and audit log
pub struct Registry {
    tasks: Vec<Task>,
    logs: Vec<LogEntry>,
    store: Box<dyn BlobStore>,
    last_error: Option<String>,
}

impl Registry {
    /// Opens a registry over the given store, loading any persisted state.
    ///
    /// A missing or unreadable blob degrades to an empty collection; the
    /// failure is surfaced through [`Registry::last_error`].
    pub fn open(store: Box<dyn BlobStore>) -> Self {
        let mut last_error = None;

        let tasks = Self::load_blob(store.as_ref(), TASKS_KEY, &mut last_error);
        let logs = Self::load_blob(store.as_ref(), LOGS_KEY, &mut last_error);

        Self {
            tasks,
            logs,
            store,
            last_error,
        }
    }

    fn load_blob<T: serde::de::DeserializeOwned>(
        store: &dyn BlobStore,
        key: &str,
        last_error: &mut Option<String>,
    ) -> Vec<T> {
        match store.load(key) {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(items) => items,
                Err(e) => {
                    warn!(key, error = %e, "discarding unreadable blob");
                    *last_error = Some(format!("Failed to parse stored {}: {}", key, e));
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key, error = %e, "failed to load blob");
                *last_error = Some(format!("Failed to load {}: {:#}", key, e));
                Vec::new()
            }
        }
    }

    /// Read-only view of the task collection, in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Read-only view of the audit log, oldest first
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// The most recent persistence failure, if the last save did not land
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Looks up a task by id
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    fn index_of(&self, id: &TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Creates a task from validated input.
    ///
    /// Non-parallel tasks start at the assignee's next free slot (the
    /// requested start, or today, serves as the preferred date when the
    /// backlog is empty).
    pub fn create(&mut self, input: TaskInput) -> Result<Task> {
        validate_name(&input.name)?;
        validate_assignee(&input.assignee)?;
        validate_manager(&input.manager)?;
        validate_duration(input.duration_days)?;

        let now = Utc::now();
        let preferred = input.start_date.unwrap_or_else(|| now.date_naive());
        let start = if input.parallel {
            preferred
        } else {
            next_available_slot(&input.assignee, preferred, &self.tasks)
        };
        let end = calculate_end_date(start, input.duration_days);

        let task = Task {
            id: TaskId::new(&input.name, now),
            name: input.name,
            start_date: start,
            end_date: end,
            duration_days: input.duration_days,
            assignee: input.assignee,
            manager: input.manager,
            status: TaskStatus::Todo,
            priority: input.priority,
            urgent: false,
            parallel: input.parallel,
            link: input.link,
            created_at: now,
            updated_at: now,
        };

        self.tasks.push(task.clone());
        self.log(LogEntry::for_task(
            task.id.clone(),
            LogAction::Created,
            format!("Created task '{}' for {}", task.name, task.assignee),
            Some(json!({
                "start_date": task.start_date,
                "end_date": task.end_date,
                "duration_days": task.duration_days,
            })),
        ));

        info!(id = %task.id, assignee = %task.assignee, "created task");
        self.persist();
        Ok(task)
    }

    /// Applies a partial update.
    ///
    /// `end_date` is re-derived whenever the patch touches `start_date` or
    /// `duration_days`. An `updated` log entry is emitted only when some
    /// field actually changed value.
    pub fn update(&mut self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        let idx = self.index_of(id)?;

        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(assignee) = &patch.assignee {
            validate_assignee(assignee)?;
        }
        if let Some(manager) = &patch.manager {
            validate_manager(manager)?;
        }
        if let Some(duration) = patch.duration_days {
            validate_duration(duration)?;
        }

        let before = self.tasks[idx].clone();
        let reschedule = patch.start_date.is_some() || patch.duration_days.is_some();

        {
            let task = &mut self.tasks[idx];
            if let Some(name) = patch.name {
                task.name = name;
            }
            if let Some(assignee) = patch.assignee {
                task.assignee = assignee;
            }
            if let Some(manager) = patch.manager {
                task.manager = manager;
            }
            if let Some(duration) = patch.duration_days {
                task.duration_days = duration;
            }
            if let Some(start) = patch.start_date {
                task.start_date = start;
            }
            if let Some(priority) = patch.priority {
                task.priority = Some(priority);
            }
            if let Some(parallel) = patch.parallel {
                task.parallel = parallel;
            }
            if let Some(link) = patch.link {
                task.link = Some(link);
            }
            if reschedule {
                task.end_date = calculate_end_date(task.start_date, task.duration_days);
            }
            task.updated_at = Utc::now();
        }

        let changed = changed_fields(&before, &self.tasks[idx]);
        if !changed.is_empty() {
            self.log(LogEntry::for_task(
                id.clone(),
                LogAction::Updated,
                format!(
                    "Updated task '{}': {}",
                    self.tasks[idx].name,
                    changed.join(", ")
                ),
                Some(json!({ "fields": changed })),
            ));
        }

        info!(id = %id, "updated task");
        self.persist();
        Ok(self.tasks[idx].clone())
    }

    /// Marks a task urgent, preempting the assignee's other work.
    ///
    /// Every other task of the same assignee that is not yet approved is
    /// moved to `Blocked`. Fails with a conflict while another task of the
    /// assignee is already urgent.
    pub fn set_urgent(&mut self, id: &TaskId) -> Result<Task> {
        let idx = self.index_of(id)?;
        let assignee = self.tasks[idx].assignee.clone();
        let target_name = self.tasks[idx].name.clone();

        if self
            .tasks
            .iter()
            .any(|t| &t.id != id && t.assignee == assignee && t.urgent)
        {
            return Err(RegistryError::Conflict(format!(
                "Assignee {} already has an urgent task",
                assignee
            )));
        }

        let now = Utc::now();
        let mut blocked_logs = Vec::new();
        for task in self.tasks.iter_mut() {
            if &task.id != id && task.assignee == assignee && !task.status.is_approved() {
                task.status = TaskStatus::Blocked;
                task.updated_at = now;
                blocked_logs.push(LogEntry::for_task(
                    task.id.clone(),
                    LogAction::Blocked,
                    format!(
                        "Task '{}' blocked by urgent task '{}'",
                        task.name, target_name
                    ),
                    None,
                ));
            }
        }

        {
            let target = &mut self.tasks[idx];
            target.urgent = true;
            target.status = TaskStatus::Urgent;
            target.updated_at = now;
        }

        let blocked_count = blocked_logs.len();
        for entry in blocked_logs {
            self.log(entry);
        }
        self.log(LogEntry::for_task(
            id.clone(),
            LogAction::UrgentSet,
            format!("Task '{}' marked urgent", target_name),
            Some(json!({ "blocked": blocked_count })),
        ));

        info!(id = %id, assignee = %assignee, blocked = blocked_count, "task marked urgent");
        self.persist();
        Ok(self.tasks[idx].clone())
    }

    /// Resolves a task's urgency, releasing the assignee's blocked work.
    ///
    /// The target returns to `Todo` with the flag cleared; every blocked
    /// task of the same assignee returns to `Todo`.
    pub fn resolve_urgent(&mut self, id: &TaskId) -> Result<Task> {
        let idx = self.index_of(id)?;

        if !self.tasks[idx].urgent {
            return Err(RegistryError::InvalidState(format!(
                "Task {} is not urgent",
                id
            )));
        }

        let assignee = self.tasks[idx].assignee.clone();
        let target_name = self.tasks[idx].name.clone();
        let now = Utc::now();

        let mut unblocked_logs = Vec::new();
        for task in self.tasks.iter_mut() {
            if &task.id != id && task.assignee == assignee && task.status == TaskStatus::Blocked {
                task.status = TaskStatus::Todo;
                task.updated_at = now;
                unblocked_logs.push(LogEntry::for_task(
                    task.id.clone(),
                    LogAction::Unblocked,
                    format!("Task '{}' unblocked", task.name),
                    None,
                ));
            }
        }

        {
            let target = &mut self.tasks[idx];
            target.urgent = false;
            target.status = TaskStatus::Todo;
            target.updated_at = now;
        }

        let unblocked_count = unblocked_logs.len();
        for entry in unblocked_logs {
            self.log(entry);
        }
        self.log(LogEntry::for_task(
            id.clone(),
            LogAction::UrgentResolved,
            format!("Urgency resolved for task '{}'", target_name),
            Some(json!({ "unblocked": unblocked_count })),
        ));

        info!(id = %id, assignee = %assignee, unblocked = unblocked_count, "urgency resolved");
        self.persist();
        Ok(self.tasks[idx].clone())
    }

    /// Moves a task to a new board status.
    ///
    /// `Blocked` and `Urgent` belong to the urgency protocol: a frozen task
    /// can only move within those two states, and a normal task cannot be
    /// moved into them by hand. A same-status move still bumps
    /// `updated_at` and is logged.
    pub fn move_status(&mut self, id: &TaskId, next: TaskStatus) -> Result<Task> {
        let idx = self.index_of(id)?;
        let current = self.tasks[idx].status;

        if current.is_frozen() && !next.is_frozen() {
            return Err(RegistryError::InvalidState(format!(
                "Task {} is {}; resolve its urgency before moving it",
                id, current
            )));
        }
        if !current.is_frozen() && next.is_frozen() {
            return Err(RegistryError::InvalidState(format!(
                "Status {} is managed by the urgency workflow",
                next
            )));
        }

        {
            let task = &mut self.tasks[idx];
            task.status = next;
            task.updated_at = Utc::now();
        }

        self.log(LogEntry::for_task(
            id.clone(),
            LogAction::StatusChanged,
            format!("Status changed from {} to {}", current, next),
            Some(json!({ "from": current, "to": next })),
        ));

        info!(id = %id, from = %current, to = %next, "status changed");
        self.persist();
        Ok(self.tasks[idx].clone())
    }

    /// Re-plans an assignee's sequential backlog from today, writing the
    /// new dates back to the collection
    pub fn reallocate_for(&mut self, assignee: &str) -> Result<Vec<Task>> {
        let today = Utc::now().date_naive();
        let plan = sequential_reallocate(assignee, &self.tasks, today);

        let now = Utc::now();
        for planned in &plan {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == planned.id) {
                if task.start_date != planned.start_date || task.end_date != planned.end_date {
                    task.start_date = planned.start_date;
                    task.end_date = planned.end_date;
                    task.updated_at = now;
                }
            }
        }

        self.log(LogEntry::system(
            LogAction::Reallocated,
            format!("Reallocated {} tasks for {}", plan.len(), assignee),
            Some(json!({ "assignee": assignee, "count": plan.len() })),
        ));

        info!(assignee, count = plan.len(), "reallocated backlog");
        self.persist();
        Ok(plan)
    }

    /// Deletes a task. A missing id is an error, not a silent no-op.
    pub fn delete(&mut self, id: &TaskId) -> Result<()> {
        let idx = self.index_of(id)?;
        let task = self.tasks.remove(idx);

        self.log(LogEntry::for_task(
            task.id.clone(),
            LogAction::Deleted,
            format!("Deleted task '{}'", task.name),
            None,
        ));

        info!(id = %id, "deleted task");
        self.persist();
        Ok(())
    }

    /// Tasks conflicting with the given task (same assignee, overlapping
    /// dates, sequentially scheduled)
    pub fn conflicts_for(&self, id: &TaskId) -> Result<Vec<&Task>> {
        let idx = self.index_of(id)?;
        Ok(find_conflicts(&self.tasks[idx], &self.tasks))
    }

    fn log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    /// Saves the full collections. Runs strictly after the in-memory
    /// mutation; failure is surfaced, never rolled back.
    fn persist(&mut self) {
        let result = serde_json::to_string(&self.tasks)
            .map_err(anyhow::Error::from)
            .and_then(|blob| self.store.save(TASKS_KEY, &blob))
            .and_then(|_| {
                let blob = serde_json::to_string(&self.logs)?;
                self.store.save(LOGS_KEY, &blob)
            });

        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                warn!(error = %e, "failed to persist registry; in-memory state stays authoritative");
                self.last_error = Some(format!("Failed to persist: {:#}", e));
            }
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RegistryError::Validation(
            "Task name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_assignee(assignee: &str) -> Result<()> {
    if assignee.trim().is_empty() {
        return Err(RegistryError::Validation(
            "Task assignee must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_manager(manager: &str) -> Result<()> {
    if manager.trim().is_empty() {
        return Err(RegistryError::Validation(
            "Task manager must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_duration(duration_days: u32) -> Result<()> {
    if duration_days == 0 {
        return Err(RegistryError::Validation(
            "Task duration must be a positive number of business days".to_string(),
        ));
    }
    Ok(())
}

fn changed_fields(before: &Task, after: &Task) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if before.name != after.name {
        changed.push("name");
    }
    if before.assignee != after.assignee {
        changed.push("assignee");
    }
    if before.manager != after.manager {
        changed.push("manager");
    }
    if before.duration_days != after.duration_days {
        changed.push("duration_days");
    }
    if before.start_date != after.start_date {
        changed.push("start_date");
    }
    if before.end_date != after.end_date {
        changed.push("end_date");
    }
    if before.priority != after.priority {
        changed.push("priority");
    }
    if before.parallel != after.parallel {
        changed.push("parallel");
    }
    if before.link != after.link {
        changed.push("link");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::parse_day;
    use crate::storage::{FileStore, MemoryStore};
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    fn registry() -> Registry {
        Registry::open(Box::new(MemoryStore::new()))
    }

    fn input(name: &str, assignee: &str, start: Option<&str>, duration: u32) -> TaskInput {
        TaskInput {
            name: name.to_string(),
            assignee: assignee.to_string(),
            manager: "PM".to_string(),
            duration_days: duration,
            start_date: start.map(day),
            ..Default::default()
        }
    }

    #[test]
    fn create_rejects_invalid_input() {
        let mut reg = registry();

        let empty_name = input("  ", "DEV1", None, 5);
        assert!(matches!(
            reg.create(empty_name),
            Err(RegistryError::Validation(_))
        ));

        let no_assignee = input("Task", "", None, 5);
        assert!(matches!(
            reg.create(no_assignee),
            Err(RegistryError::Validation(_))
        ));

        let mut no_manager = input("Task", "DEV1", None, 5);
        no_manager.manager = String::new();
        assert!(matches!(
            reg.create(no_manager),
            Err(RegistryError::Validation(_))
        ));

        let zero_duration = input("Task", "DEV1", None, 0);
        assert!(matches!(
            reg.create(zero_duration),
            Err(RegistryError::Validation(_))
        ));

        // No side effects on failure
        assert!(reg.tasks().is_empty());
        assert!(reg.logs().is_empty());
    }

    #[test]
    fn create_derives_end_date_over_business_days() {
        let mut reg = registry();

        // Monday 2024-01-01 + 5 business days: Mon-Fri
        let task = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        assert_eq!(task.start_date, day("2024-01-01"));
        assert_eq!(task.end_date, day("2024-01-05"));
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(!task.urgent);

        let log = reg.logs().last().unwrap();
        assert_eq!(log.action, LogAction::Created);
        assert_eq!(log.task_id, Some(task.id));
    }

    #[test]
    fn create_sequential_takes_next_free_slot() {
        let mut reg = registry();
        reg.create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        // No explicit start: slot opens the Monday after A ends Friday
        let b = reg.create(input("Task B", "DEV1", None, 3)).unwrap();
        assert_eq!(b.start_date, day("2024-01-08"));
        assert_eq!(b.end_date, day("2024-01-10"));
    }

    #[test]
    fn create_sequential_ignores_requested_start_when_backlog_exists() {
        let mut reg = registry();
        reg.create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        let b = reg
            .create(input("Task B", "DEV1", Some("2024-01-02"), 1))
            .unwrap();
        assert_eq!(b.start_date, day("2024-01-08"));
    }

    #[test]
    fn create_parallel_keeps_requested_start() {
        let mut reg = registry();
        reg.create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        let mut parallel = input("Task P", "DEV1", Some("2024-01-02"), 2);
        parallel.parallel = true;
        let p = reg.create(parallel).unwrap();

        assert_eq!(p.start_date, day("2024-01-02"));
        assert_eq!(p.end_date, day("2024-01-03"));
    }

    #[test]
    fn update_recomputes_end_date_and_logs_changes() {
        let mut reg = registry();
        let task = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        let patch = TaskPatch {
            duration_days: Some(3),
            ..Default::default()
        };
        let updated = reg.update(&task.id, patch).unwrap();

        assert_eq!(updated.end_date, day("2024-01-03"));

        let log = reg.logs().last().unwrap();
        assert_eq!(log.action, LogAction::Updated);
        let fields = &log.metadata.as_ref().unwrap()["fields"];
        assert!(fields.as_array().unwrap().contains(&json!("duration_days")));
        assert!(fields.as_array().unwrap().contains(&json!("end_date")));
    }

    #[test]
    fn update_without_changes_emits_no_log() {
        let mut reg = registry();
        let task = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let logs_before = reg.logs().len();
        let stamp_before = task.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(10));

        // Same duration: nothing actually differs
        let patch = TaskPatch {
            duration_days: Some(5),
            ..Default::default()
        };
        let updated = reg.update(&task.id, patch).unwrap();

        assert_eq!(reg.logs().len(), logs_before);
        assert!(updated.updated_at > stamp_before);
    }

    #[test]
    fn update_missing_task_is_not_found() {
        let mut reg = registry();
        let ghost = TaskId::new("ghost", Utc::now());

        assert!(matches!(
            reg.update(&ghost, TaskPatch::default()),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn update_rejects_invalid_patch_values() {
        let mut reg = registry();
        let task = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        let patch = TaskPatch {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            reg.update(&task.id, patch),
            Err(RegistryError::Validation(_))
        ));

        let patch = TaskPatch {
            duration_days: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            reg.update(&task.id, patch),
            Err(RegistryError::Validation(_))
        ));

        // Failed updates leave the task untouched
        assert_eq!(reg.task(&task.id).unwrap().duration_days, 5);
    }

    #[test]
    fn set_urgent_preempts_the_assignees_backlog() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let b = reg.create(input("Task B", "DEV1", None, 3)).unwrap();
        let mut approved = reg.create(input("Task C", "DEV1", None, 1)).unwrap();
        approved = reg.move_status(&approved.id, TaskStatus::Approved).unwrap();
        let other = reg
            .create(input("Task D", "DEV2", Some("2024-01-01"), 2))
            .unwrap();

        let urgent = reg.set_urgent(&a.id).unwrap();

        assert!(urgent.urgent);
        assert_eq!(urgent.status, TaskStatus::Urgent);
        assert_eq!(reg.task(&b.id).unwrap().status, TaskStatus::Blocked);
        // Approved and other-assignee tasks untouched
        assert_eq!(reg.task(&approved.id).unwrap().status, TaskStatus::Approved);
        assert_eq!(reg.task(&other.id).unwrap().status, TaskStatus::Todo);

        let actions: Vec<LogAction> = reg.logs().iter().map(|l| l.action).collect();
        assert!(actions.contains(&LogAction::Blocked));
        assert_eq!(*actions.last().unwrap(), LogAction::UrgentSet);
    }

    #[test]
    fn second_urgent_task_for_assignee_conflicts() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let b = reg.create(input("Task B", "DEV1", None, 3)).unwrap();

        reg.set_urgent(&a.id).unwrap();
        assert!(matches!(
            reg.set_urgent(&b.id),
            Err(RegistryError::Conflict(_))
        ));

        // A different assignee may still go urgent
        let c = reg
            .create(input("Task C", "DEV2", Some("2024-01-01"), 1))
            .unwrap();
        assert!(reg.set_urgent(&c.id).is_ok());
    }

    #[test]
    fn at_most_one_urgent_task_per_assignee() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let b = reg.create(input("Task B", "DEV1", None, 3)).unwrap();

        reg.set_urgent(&a.id).unwrap();
        reg.resolve_urgent(&a.id).unwrap();
        reg.set_urgent(&b.id).unwrap();
        let _ = reg.set_urgent(&a.id); // rejected

        let urgent_count = reg
            .tasks()
            .iter()
            .filter(|t| t.assignee == "DEV1" && t.urgent)
            .count();
        assert_eq!(urgent_count, 1);
    }

    #[test]
    fn resolve_urgent_releases_blocked_tasks() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let b = reg.create(input("Task B", "DEV1", None, 3)).unwrap();

        reg.set_urgent(&a.id).unwrap();
        let resolved = reg.resolve_urgent(&a.id).unwrap();

        assert!(!resolved.urgent);
        assert_eq!(resolved.status, TaskStatus::Todo);
        assert_eq!(reg.task(&b.id).unwrap().status, TaskStatus::Todo);

        let actions: Vec<LogAction> = reg.logs().iter().map(|l| l.action).collect();
        assert!(actions.contains(&LogAction::Unblocked));
        assert_eq!(*actions.last().unwrap(), LogAction::UrgentResolved);
    }

    #[test]
    fn resolve_requires_the_urgent_flag() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        assert!(matches!(
            reg.resolve_urgent(&a.id),
            Err(RegistryError::InvalidState(_))
        ));
    }

    #[test]
    fn move_status_logs_old_and_new() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        let moved = reg.move_status(&a.id, TaskStatus::Doing).unwrap();
        assert_eq!(moved.status, TaskStatus::Doing);

        let log = reg.logs().last().unwrap();
        assert_eq!(log.action, LogAction::StatusChanged);
        let meta = log.metadata.as_ref().unwrap();
        assert_eq!(meta["from"], "todo");
        assert_eq!(meta["to"], "doing");
    }

    #[test]
    fn same_status_move_still_bumps_and_logs() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let logs_before = reg.logs().len();
        let stamp_before = a.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(10));
        let moved = reg.move_status(&a.id, TaskStatus::Todo).unwrap();

        assert_eq!(moved.status, TaskStatus::Todo);
        assert!(moved.updated_at > stamp_before);
        assert_eq!(reg.logs().len(), logs_before + 1);
        // Everything else untouched
        assert_eq!(moved.start_date, a.start_date);
        assert_eq!(moved.end_date, a.end_date);
    }

    #[test]
    fn frozen_statuses_cannot_be_escaped_by_move() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let b = reg.create(input("Task B", "DEV1", None, 3)).unwrap();

        reg.set_urgent(&a.id).unwrap();

        // Urgent target and blocked sibling are both stuck
        assert!(matches!(
            reg.move_status(&a.id, TaskStatus::Doing),
            Err(RegistryError::InvalidState(_))
        ));
        assert!(matches!(
            reg.move_status(&b.id, TaskStatus::Todo),
            Err(RegistryError::InvalidState(_))
        ));
        assert_eq!(reg.task(&a.id).unwrap().status, TaskStatus::Urgent);
        assert_eq!(reg.task(&b.id).unwrap().status, TaskStatus::Blocked);

        // Moves within the frozen pair stay legal
        assert!(reg.move_status(&b.id, TaskStatus::Blocked).is_ok());
    }

    #[test]
    fn frozen_statuses_cannot_be_entered_by_move() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        assert!(matches!(
            reg.move_status(&a.id, TaskStatus::Urgent),
            Err(RegistryError::InvalidState(_))
        ));
        assert!(matches!(
            reg.move_status(&a.id, TaskStatus::Blocked),
            Err(RegistryError::InvalidState(_))
        ));
    }

    #[test]
    fn reallocate_writes_new_dates_back() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2020-01-01"), 5))
            .unwrap();
        let mut b_input = input("Task B", "DEV1", Some("2020-01-01"), 3);
        b_input.priority = Some(1);
        let b = reg.create(b_input).unwrap();

        let plan = reg.reallocate_for("DEV1").unwrap();
        assert_eq!(plan.len(), 2);
        // Priority 1 task goes first
        assert_eq!(plan[0].id, b.id);

        // Written back to the collection, end-to-end without overlap
        let stored_a = reg.task(&a.id).unwrap();
        let stored_b = reg.task(&b.id).unwrap();
        assert_eq!(stored_a.start_date, plan[1].start_date);
        assert!(stored_b.end_date < stored_a.start_date);

        let log = reg.logs().last().unwrap();
        assert_eq!(log.action, LogAction::Reallocated);
        assert!(log.task_id.is_none());
        assert_eq!(log.metadata.as_ref().unwrap()["count"], 2);
    }

    #[test]
    fn delete_removes_and_logs() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        reg.delete(&a.id).unwrap();
        assert!(reg.task(&a.id).is_none());
        assert_eq!(reg.logs().last().unwrap().action, LogAction::Deleted);

        // Deleting again reports not-found
        assert!(matches!(
            reg.delete(&a.id),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn conflicts_surface_overlapping_work() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        // Parallel task sharing the same days
        let mut p = input("Task P", "DEV1", Some("2024-01-01"), 5);
        p.parallel = true;
        let p = reg.create(p).unwrap();

        // The parallel task is never a conflict for A
        assert!(reg.conflicts_for(&a.id).unwrap().is_empty());

        // But A conflicts with the parallel task's span (A is sequential)
        let conflicts = reg.conflicts_for(&p.id).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, a.id);
    }

    #[test]
    fn persistence_failure_surfaces_without_rollback() {
        struct FailingStore;

        impl BlobStore for FailingStore {
            fn save(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
                anyhow::bail!("disk full")
            }

            fn load(&self, _key: &str) -> anyhow::Result<Option<String>> {
                Ok(None)
            }
        }

        let mut reg = Registry::open(Box::new(FailingStore));
        let task = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();

        // The operation succeeded and the task is visible...
        assert!(reg.task(&task.id).is_some());
        // ...but the failure is surfaced
        assert!(reg.last_error().unwrap().contains("disk full"));
    }

    #[test]
    fn state_survives_reopen_through_the_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let store_dir = dir.path().join("store");

        let task_id = {
            let mut reg = Registry::open(Box::new(FileStore::new(&store_dir)));
            let task = reg
                .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
                .unwrap();
            reg.move_status(&task.id, TaskStatus::Doing).unwrap();
            task.id
        };

        let reg = Registry::open(Box::new(FileStore::new(&store_dir)));
        assert!(reg.last_error().is_none());
        let task = reg.task(&task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Doing);
        assert_eq!(reg.logs().len(), 2);
    }

    #[test]
    fn corrupt_blob_degrades_to_empty_with_error() {
        let store = MemoryStore::new();
        store.save(TASKS_KEY, "not json").unwrap();

        let reg = Registry::open(Box::new(store));
        assert!(reg.tasks().is_empty());
        assert!(reg.last_error().unwrap().contains("tasks"));
    }

    #[test]
    fn audit_log_is_append_only() {
        let mut reg = registry();
        let a = reg
            .create(input("Task A", "DEV1", Some("2024-01-01"), 5))
            .unwrap();
        let first = reg.logs().first().unwrap().clone();

        reg.move_status(&a.id, TaskStatus::Doing).unwrap();
        reg.set_urgent(&a.id).unwrap();
        reg.resolve_urgent(&a.id).unwrap();
        reg.delete(&a.id).unwrap();

        // Earlier entries are never rewritten, count only grows
        assert_eq!(reg.logs().first().unwrap(), &first);
        assert_eq!(reg.logs().len(), 5);
    }
}
