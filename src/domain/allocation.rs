//! Allocation engine
//!
//! Pure functions over a snapshot of the task collection: end-date
//! derivation, overlap/conflict detection, next-free-slot lookup and
//! sequential reallocation of an assignee's backlog. Nothing here mutates
//! its input or performs I/O; the registry applies the results.

use chrono::NaiveDate;

use super::calendar::{add_business_days, is_weekend, next_business_day};
use super::task::Task;

/// Derives a task's end date from its start and business-day duration.
///
/// The start day counts as the first occupied business day when it falls on
/// one, so a 5-day task starting Monday ends the same week's Friday. A
/// weekend start occupies the following `duration_days` business days. With
/// `duration_days == 0` the start is returned unchanged; the registry's
/// input validation keeps zero durations out of stored tasks.
pub fn calculate_end_date(start: NaiveDate, duration_days: u32) -> NaiveDate {
    if duration_days == 0 {
        return start;
    }

    if is_weekend(start) {
        add_business_days(start, duration_days)
    } else {
        add_business_days(start, duration_days - 1)
    }
}

/// Tests whether two tasks' date ranges overlap.
///
/// Ranges are inclusive on both ends, so back-to-back tasks sharing a
/// boundary day DO overlap. That is intentional: the ranges are day spans,
/// and two tasks both occupying the shared day compete for it.
pub fn has_overlap(a: &Task, b: &Task) -> bool {
    a.start_date <= b.end_date && b.start_date <= a.end_date
}

/// Finds the tasks conflicting with `task`: same assignee, not the task
/// itself, sequentially scheduled (the *other* task non-parallel) and
/// overlapping in dates. Order follows `all`.
pub fn find_conflicts<'a>(task: &Task, all: &'a [Task]) -> Vec<&'a Task> {
    all.iter()
        .filter(|other| {
            other.id != task.id
                && other.assignee == task.assignee
                && !other.parallel
                && has_overlap(task, other)
        })
        .collect()
}

/// Finds the next start date available for sequential work by `assignee`.
///
/// Looks at the assignee's non-parallel, not-yet-approved tasks: with none,
/// the preferred date is free; otherwise the slot opens on the first
/// business day after the backlog's latest end date.
pub fn next_available_slot(assignee: &str, preferred: NaiveDate, all: &[Task]) -> NaiveDate {
    let latest_end = all
        .iter()
        .filter(|t| t.assignee == assignee && !t.parallel && !t.status.is_approved())
        .map(|t| t.end_date)
        .max();

    match latest_end {
        Some(end) => next_business_day(end),
        None => preferred,
    }
}

/// Re-plans an assignee's sequential backlog from `reference`.
///
/// The assignee's non-parallel, not-yet-approved tasks are ordered by
/// priority rank (missing priority ranks last) and then creation time, and
/// laid end to end: each task starts at the cursor, ends after its own
/// duration, and the cursor moves to the next business day. Returns the
/// re-dated tasks; the input is left untouched.
pub fn sequential_reallocate(assignee: &str, all: &[Task], reference: NaiveDate) -> Vec<Task> {
    let mut backlog: Vec<&Task> = all
        .iter()
        .filter(|t| t.assignee == assignee && !t.parallel && !t.status.is_approved())
        .collect();

    backlog.sort_by(|a, b| {
        a.priority_rank()
            .cmp(&b.priority_rank())
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let mut cursor = reference;
    backlog
        .into_iter()
        .map(|task| {
            let end = calculate_end_date(cursor, task.duration_days);
            let reallocated = Task {
                start_date: cursor,
                end_date: end,
                ..task.clone()
            };
            cursor = next_business_day(end);
            reallocated
        })
        .collect()
}
