//! Projection and reallocation commands

use anyhow::Result;
use chrono::Utc;

use super::output::Output;
use crate::domain::calendar::parse_day;
use crate::domain::TaskId;
use crate::registry::Registry;
use crate::storage::Workspace;
use crate::views::{calendar, kanban, stats};

fn open_registry() -> Result<Registry> {
    let workspace = Workspace::open_current()?;
    Ok(Registry::open(Box::new(workspace.blob_store())))
}

/// `cadence reallocate <assignee>`
pub fn reallocate(output: &Output, assignee: &str) -> Result<()> {
    let mut registry = open_registry()?;
    let plan = registry.reallocate_for(assignee)?;

    if let Some(error) = registry.last_error() {
        output.warning(error);
    }

    if output.is_json() {
        output.data(&plan);
    } else if plan.is_empty() {
        println!("No sequential tasks to reallocate for {}", assignee);
    } else {
        output.success(&format!(
            "Reallocated {} tasks for {}",
            plan.len(),
            assignee
        ));
        for task in &plan {
            println!(
                "{}  {}  {} to {}",
                task.id, task.name, task.start_date, task.end_date
            );
        }
    }

    Ok(())
}

/// `cadence board`
pub fn board(output: &Output) -> Result<()> {
    let registry = open_registry()?;
    let board = kanban::board(registry.tasks());

    if output.is_json() {
        output.data(&board);
        return Ok(());
    }

    for column in &board.columns {
        println!("== {} ({})", column.status, column.tasks.len());
        for task in &column.tasks {
            let marker = if task.urgent { "!" } else { " " };
            println!(
                " {} {}  {}  {} to {}",
                marker, task.id, task.name, task.start_date, task.end_date
            );
        }
        output.blank();
    }

    Ok(())
}

/// `cadence calendar [--from] [--to]`
pub fn calendar_view(output: &Output, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let registry = open_registry()?;

    let events = match (from, to) {
        (Some(from), Some(to)) => {
            let from = parse_day(from)
                .ok_or_else(|| anyhow::anyhow!("Invalid date '{}' (expected YYYY-MM-DD)", from))?;
            let to = parse_day(to)
                .ok_or_else(|| anyhow::anyhow!("Invalid date '{}' (expected YYYY-MM-DD)", to))?;
            calendar::events_in_range(registry.tasks(), from, to)
        }
        _ => calendar::events(registry.tasks()),
    };

    if output.is_json() {
        output.data(&events);
        return Ok(());
    }

    if events.is_empty() {
        println!("No events");
        return Ok(());
    }

    let mut grouped: std::collections::BTreeMap<chrono::NaiveDate, Vec<&calendar::CalendarEvent>> =
        std::collections::BTreeMap::new();
    for event in &events {
        grouped.entry(event.start).or_default().push(event);
    }

    for (date, day_events) in grouped {
        println!("{}", date);
        for event in day_events {
            println!(
                "  {}  {}  {} ({}, ends {})",
                event.id, event.title, event.assignee, event.status, event.end
            );
        }
    }

    Ok(())
}

/// `cadence stats`
pub fn stats_view(output: &Output) -> Result<()> {
    let registry = open_registry()?;
    let stats = stats::allocation_stats(registry.tasks(), Utc::now().date_naive());

    if output.is_json() {
        output.data(&stats);
        return Ok(());
    }

    println!("Tasks:      {}", stats.total);
    println!("Conflicts:  {}", stats.conflicts);
    println!("Overdue:    {}", stats.overdue);
    println!("Due soon:   {}", stats.due_soon);
    output.blank();

    println!("By status:");
    for count in &stats.by_status {
        println!("  {:<18} {}", count.status.to_string(), count.count);
    }
    output.blank();

    println!("Priorities:");
    println!("  high      {}", stats.priorities.high);
    println!("  medium    {}", stats.priorities.medium);
    println!("  low       {}", stats.priorities.low);
    println!("  unranked  {}", stats.priorities.unranked);
    output.blank();

    println!("Workload:");
    for load in &stats.workloads {
        println!(
            "  {:<12} {} tasks over {} business days, {} conflicts",
            load.assignee, load.tasks, load.business_days, load.conflicts
        );
    }

    Ok(())
}

/// `cadence log [--task <id>]`
pub fn log_view(output: &Output, task: Option<&str>) -> Result<()> {
    let registry = open_registry()?;

    let filter: Option<TaskId> = match task {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };

    let entries: Vec<_> = registry
        .logs()
        .iter()
        .filter(|e| filter.as_ref().map_or(true, |id| e.task_id.as_ref() == Some(id)))
        .collect();

    if output.is_json() {
        output.data(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries");
        return Ok(());
    }

    for entry in entries {
        let target = entry
            .task_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "system".to_string());
        println!(
            "{}  {:<15} {:<9} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action.label(),
            target,
            entry.description
        );
    }

    Ok(())
}
