//! Kanban projection: tasks partitioned into the seven status columns

use serde::Serialize;

use crate::domain::{Task, TaskStatus};

/// The full board: one column per status, in fixed order
#[derive(Debug, Serialize)]
pub struct Board {
    pub columns: Vec<Column>,
}

/// One status column
#[derive(Debug, Serialize)]
pub struct Column {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

/// Partitions tasks into the seven fixed columns.
///
/// Within a column, tasks sort by priority rank (missing priority last)
/// and then start date.
pub fn board(tasks: &[Task]) -> Board {
    let columns = TaskStatus::ALL
        .into_iter()
        .map(|status| {
            let mut bucket: Vec<Task> = tasks
                .iter()
                .filter(|t| t.status == status)
                .cloned()
                .collect();

            bucket.sort_by(|a, b| {
                a.priority_rank()
                    .cmp(&b.priority_rank())
                    .then_with(|| a.start_date.cmp(&b.start_date))
            });

            Column {
                status,
                tasks: bucket,
            }
        })
        .collect();

    Board { columns }
}

impl Board {
    /// Returns the column for a status
    pub fn column(&self, status: TaskStatus) -> &Column {
        // ALL covers every status, so the find always succeeds
        self.columns
            .iter()
            .find(|c| c.status == status)
            .expect("board has a column per status")
    }
}
