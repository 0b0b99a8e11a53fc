//! Read-model projections
//!
//! Pure derived views over the registry's task collection: calendar events,
//! the kanban board and allocation statistics. Projections never mutate
//! tasks and are recomputed on every read.

pub mod calendar;
pub mod kanban;
pub mod stats;
