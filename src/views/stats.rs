//! Workload and allocation statistics
//!
//! Derived counts and groupings over the task collection, recomputed on
//! every read without an incremental cache.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::allocation::find_conflicts;
use crate::domain::calendar::business_days_in_range;
use crate::domain::{Task, TaskStatus};

/// Snapshot of the collection's allocation state
#[derive(Debug, Serialize)]
pub struct AllocationStats {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub priorities: PriorityBands,
    pub workloads: Vec<AssigneeLoad>,
    /// Pairwise scheduling conflicts across the whole collection
    pub conflicts: usize,
    /// Unapproved tasks whose end date has passed
    pub overdue: usize,
    /// Unapproved tasks ending within the next 7 calendar days
    pub due_soon: usize,
}

/// Task count for one status column
#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
}

/// Tasks bucketed by priority band
#[derive(Debug, Default, Serialize)]
pub struct PriorityBands {
    /// Priority 1-2
    pub high: usize,
    /// Priority 3-4
    pub medium: usize,
    /// Priority 5 and above
    pub low: usize,
    /// No explicit priority
    pub unranked: usize,
}

/// One assignee's scheduled load
#[derive(Debug, Serialize)]
pub struct AssigneeLoad {
    pub assignee: String,
    pub tasks: usize,
    /// Distinct business days covered by the assignee's tasks
    pub business_days: usize,
    /// Conflicts among the assignee's tasks (each pair counted once)
    pub conflicts: usize,
}

/// Computes allocation statistics relative to `today`
pub fn allocation_stats(tasks: &[Task], today: NaiveDate) -> AllocationStats {
    let mut priorities = PriorityBands::default();
    let mut overdue = 0;
    let mut due_soon = 0;
    let due_horizon = today + chrono::Duration::days(7);

    for task in tasks {
        match task.priority {
            Some(p) if p <= 2 => priorities.high += 1,
            Some(p) if p <= 4 => priorities.medium += 1,
            Some(_) => priorities.low += 1,
            None => priorities.unranked += 1,
        }

        if !task.status.is_approved() {
            if task.end_date < today {
                overdue += 1;
            } else if task.end_date <= due_horizon {
                due_soon += 1;
            }
        }
    }

    let by_status = TaskStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: tasks.iter().filter(|t| t.status == status).count(),
        })
        .collect();

    let workloads = assignee_loads(tasks);
    let conflicts = workloads.iter().map(|w| w.conflicts).sum();

    AllocationStats {
        total: tasks.len(),
        by_status,
        priorities,
        workloads,
        conflicts,
        overdue,
        due_soon,
    }
}

fn assignee_loads(tasks: &[Task]) -> Vec<AssigneeLoad> {
    let mut assignees: Vec<&str> = tasks.iter().map(|t| t.assignee.as_str()).collect();
    assignees.sort_unstable();
    assignees.dedup();

    assignees
        .into_iter()
        .map(|assignee| {
            let own: Vec<&Task> = tasks.iter().filter(|t| t.assignee == assignee).collect();

            let mut days: Vec<NaiveDate> = own
                .iter()
                .flat_map(|t| business_days_in_range(t.start_date, t.end_date))
                .collect();
            days.sort_unstable();
            days.dedup();

            // Each conflicting pair shows up once from either side
            let pairwise: usize = own
                .iter()
                .map(|t| find_conflicts(t, tasks).len())
                .sum::<usize>()
                / 2;

            AssigneeLoad {
                assignee: assignee.to_string(),
                tasks: own.len(),
                business_days: days.len(),
                conflicts: pairwise,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::parse_day;
    use crate::domain::TaskId;
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    fn make_task(name: &str, assignee: &str, start: &str, end: &str) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::new(name, now),
            name: name.to_string(),
            start_date: day(start),
            end_date: day(end),
            duration_days: 1,
            assignee: assignee.to_string(),
            manager: "PM".to_string(),
            status: TaskStatus::Todo,
            priority: None,
            urgent: false,
            parallel: false,
            link: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn counts_every_status_bucket() {
        let mut qa = make_task("A", "DEV1", "2024-01-01", "2024-01-01");
        qa.status = TaskStatus::Qa;
        let todo = make_task("B", "DEV1", "2024-01-02", "2024-01-02");

        let stats = allocation_stats(&[qa, todo], day("2024-01-01"));
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_status.len(), 7);

        let count_for = |status: TaskStatus| {
            stats
                .by_status
                .iter()
                .find(|c| c.status == status)
                .unwrap()
                .count
        };
        assert_eq!(count_for(TaskStatus::Qa), 1);
        assert_eq!(count_for(TaskStatus::Todo), 1);
        assert_eq!(count_for(TaskStatus::Approved), 0);
    }

    #[test]
    fn priority_bands_follow_the_color_thresholds() {
        let mut tasks = Vec::new();
        for (name, priority) in [("A", Some(1)), ("B", Some(2)), ("C", Some(3)), ("D", Some(9))] {
            let mut t = make_task(name, "DEV1", "2024-01-01", "2024-01-01");
            t.priority = priority;
            tasks.push(t);
        }
        tasks.push(make_task("E", "DEV1", "2024-01-01", "2024-01-01"));

        let stats = allocation_stats(&tasks, day("2024-01-01"));
        assert_eq!(stats.priorities.high, 2);
        assert_eq!(stats.priorities.medium, 1);
        assert_eq!(stats.priorities.low, 1);
        assert_eq!(stats.priorities.unranked, 1);
    }

    #[test]
    fn overdue_and_due_soon_skip_approved_work() {
        let today = day("2024-01-10");

        let overdue = make_task("A", "DEV1", "2024-01-01", "2024-01-05");
        let mut shipped = make_task("B", "DEV1", "2024-01-01", "2024-01-05");
        shipped.status = TaskStatus::Approved;
        let due_soon = make_task("C", "DEV1", "2024-01-10", "2024-01-12");
        let far_out = make_task("D", "DEV1", "2024-02-01", "2024-02-05");

        let stats = allocation_stats(&[overdue, shipped, due_soon, far_out], today);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_soon, 1);
    }

    #[test]
    fn workload_counts_distinct_business_days() {
        // Mon-Fri plus an overlapping Wed-Fri: five distinct days
        let a = make_task("A", "DEV1", "2024-01-01", "2024-01-05");
        let b = make_task("B", "DEV1", "2024-01-03", "2024-01-05");
        let other = make_task("C", "DEV2", "2024-01-01", "2024-01-01");

        let stats = allocation_stats(&[a, b, other], day("2024-01-01"));

        let dev1 = stats
            .workloads
            .iter()
            .find(|w| w.assignee == "DEV1")
            .unwrap();
        assert_eq!(dev1.tasks, 2);
        assert_eq!(dev1.business_days, 5);
        // A and B overlap: one conflicting pair
        assert_eq!(dev1.conflicts, 1);

        let dev2 = stats
            .workloads
            .iter()
            .find(|w| w.assignee == "DEV2")
            .unwrap();
        assert_eq!(dev2.conflicts, 0);

        assert_eq!(stats.conflicts, 1);
    }
}
