//! Task CLI commands

use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;

use super::output::Output;
use crate::domain::calendar::parse_day;
use crate::domain::{Task, TaskId, TaskInput, TaskPatch, TaskStatus};
use crate::registry::Registry;
use crate::storage::Workspace;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Non-parallel tasks are scheduled into the assignee's next free slot;
    /// the end date is derived from the start and business-day duration.
    Add {
        /// Task name
        name: String,

        /// Person responsible
        #[arg(long, short = 'a')]
        assignee: Option<String>,

        /// Accountable manager
        #[arg(long, short = 'm')]
        manager: Option<String>,

        /// Duration in business days
        #[arg(long, short = 'd')]
        days: u32,

        /// Preferred start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,

        /// Priority (lower = more urgent)
        #[arg(long, short = 'p')]
        priority: Option<u32>,

        /// Exempt from sequential slot/conflict logic
        #[arg(long)]
        parallel: bool,

        /// Reference URL
        #[arg(long)]
        link: Option<String>,
    },

    /// List tasks
    List {
        /// Only tasks for this assignee
        #[arg(long, short = 'a')]
        assignee: Option<String>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Update task fields
    Update {
        /// Task ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short = 'a')]
        assignee: Option<String>,

        #[arg(long, short = 'm')]
        manager: Option<String>,

        /// Duration in business days
        #[arg(long, short = 'd')]
        days: Option<u32>,

        /// Start date (YYYY-MM-DD); the end date is re-derived
        #[arg(long)]
        start: Option<String>,

        #[arg(long, short = 'p')]
        priority: Option<u32>,

        /// Set or clear the parallel exemption
        #[arg(long)]
        parallel: Option<bool>,

        #[arg(long)]
        link: Option<String>,
    },

    /// Move a task to another status
    Move {
        /// Task ID
        id: String,

        /// Target status (todo, doing, awaiting_approval, qa, approved)
        status: String,
    },

    /// Mark a task urgent, blocking the assignee's other tasks
    Urgent {
        /// Task ID
        id: String,
    },

    /// Resolve a task's urgency, unblocking the assignee's tasks
    Resolve {
        /// Task ID
        id: String,
    },

    /// List tasks conflicting with a task's date range
    Conflicts {
        /// Task ID
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    let workspace = Workspace::open_current()?;
    let mut registry = Registry::open(Box::new(workspace.blob_store()));

    match cmd {
        TaskCommands::Add {
            name,
            assignee,
            manager,
            days,
            start,
            priority,
            parallel,
            link,
        } => {
            let config = workspace.config();
            let input = TaskInput {
                name,
                assignee: assignee
                    .or_else(|| config.default_assignee.clone())
                    .unwrap_or_default(),
                manager: manager
                    .or_else(|| config.default_manager.clone())
                    .unwrap_or_default(),
                duration_days: days,
                start_date: start.as_deref().map(parse_date).transpose()?,
                priority,
                parallel,
                link,
            };

            let task = registry.create(input)?;
            report_store_health(&registry, output);

            if output.is_json() {
                output.data(&task);
            } else {
                output.success(&format!(
                    "Created task: {} - {} ({} to {}, {})",
                    task.id, task.name, task.start_date, task.end_date, task.assignee
                ));
            }
        }

        TaskCommands::List { assignee } => {
            let tasks: Vec<&Task> = registry
                .tasks()
                .iter()
                .filter(|t| assignee.as_deref().map_or(true, |a| t.assignee == a))
                .collect();

            if output.is_json() {
                output.data(&tasks);
            } else if tasks.is_empty() {
                println!("No tasks found");
            } else {
                println!(
                    "{:<10} {:<28} {:<10} {:<18} {:<11} {:<11} {}",
                    "ID", "NAME", "ASSIGNEE", "STATUS", "START", "END", "DAYS"
                );
                for task in tasks {
                    println!(
                        "{:<10} {:<28} {:<10} {:<18} {:<11} {:<11} {}",
                        task.id.to_string(),
                        truncate(&task.name, 27),
                        truncate(&task.assignee, 9),
                        task.status.to_string(),
                        task.start_date.to_string(),
                        task.end_date.to_string(),
                        task.duration_days,
                    );
                }
            }
        }

        TaskCommands::Show { id } => {
            let id = parse_id(&id)?;
            let task = registry
                .task(&id)
                .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

            if output.is_json() {
                output.data(task);
            } else {
                println!("ID:        {}", task.id);
                println!("Name:      {}", task.name);
                println!("Assignee:  {}", task.assignee);
                println!("Manager:   {}", task.manager);
                println!("Status:    {}", task.status);
                println!("Start:     {}", task.start_date);
                println!("End:       {}", task.end_date);
                println!("Days:      {}", task.duration_days);
                match task.priority {
                    Some(p) => println!("Priority:  {}", p),
                    None => println!("Priority:  -"),
                }
                println!("Urgent:    {}", task.urgent);
                println!("Parallel:  {}", task.parallel);
                if let Some(link) = &task.link {
                    println!("Link:      {}", link);
                }
            }
        }

        TaskCommands::Update {
            id,
            name,
            assignee,
            manager,
            days,
            start,
            priority,
            parallel,
            link,
        } => {
            let id = parse_id(&id)?;
            let patch = TaskPatch {
                name,
                assignee,
                manager,
                duration_days: days,
                start_date: start.as_deref().map(parse_date).transpose()?,
                priority,
                parallel,
                link,
            };

            let task = registry.update(&id, patch)?;
            report_store_health(&registry, output);

            if output.is_json() {
                output.data(&task);
            } else {
                output.success(&format!(
                    "Updated task: {} ({} to {})",
                    task.id, task.start_date, task.end_date
                ));
            }
        }

        TaskCommands::Move { id, status } => {
            let id = parse_id(&id)?;
            let status: TaskStatus = status.parse().map_err(|e: String| anyhow::anyhow!(e))?;

            let task = registry.move_status(&id, status)?;
            report_store_health(&registry, output);

            if output.is_json() {
                output.data(&task);
            } else {
                output.success(&format!("Moved task {} to {}", task.id, task.status));
            }
        }

        TaskCommands::Urgent { id } => {
            let id = parse_id(&id)?;
            let task = registry.set_urgent(&id)?;
            report_store_health(&registry, output);

            if output.is_json() {
                output.data(&task);
            } else {
                output.success(&format!(
                    "Task {} marked urgent; other tasks for {} are blocked",
                    task.id, task.assignee
                ));
            }
        }

        TaskCommands::Resolve { id } => {
            let id = parse_id(&id)?;
            let task = registry.resolve_urgent(&id)?;
            report_store_health(&registry, output);

            if output.is_json() {
                output.data(&task);
            } else {
                output.success(&format!(
                    "Urgency resolved for task {}; blocked tasks for {} returned to todo",
                    task.id, task.assignee
                ));
            }
        }

        TaskCommands::Conflicts { id } => {
            let id = parse_id(&id)?;
            let conflicts = registry.conflicts_for(&id)?;

            if output.is_json() {
                output.data(&conflicts);
            } else if conflicts.is_empty() {
                println!("No conflicts");
            } else {
                for task in conflicts {
                    println!(
                        "{}  {}  {} to {}",
                        task.id, task.name, task.start_date, task.end_date
                    );
                }
            }
        }

        TaskCommands::Delete { id } => {
            let id = parse_id(&id)?;
            registry.delete(&id)?;
            report_store_health(&registry, output);
            output.success(&format!("Deleted task {}", id));
        }
    }

    Ok(())
}

fn parse_id(s: &str) -> Result<TaskId> {
    s.parse().map_err(anyhow::Error::from)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    parse_day(s).ok_or_else(|| anyhow::anyhow!("Invalid date '{}' (expected YYYY-MM-DD)", s))
}

/// Surfaces a persistence failure without failing the command
fn report_store_health(registry: &Registry, output: &Output) {
    if let Some(error) = registry.last_error() {
        output.warning(error);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
