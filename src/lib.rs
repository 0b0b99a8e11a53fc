//! Cadence - business-day task scheduling for small teams
//!
//! Cadence derives task end dates from business-day durations, surfaces
//! scheduling conflicts between tasks assigned to the same person, finds
//! the next free slot for sequential work, and enforces an
//! urgency-preemption protocol that blocks a person's other tasks while
//! one task is urgent.

pub mod cli;
pub mod domain;
pub mod registry;
pub mod storage;
pub mod views;

pub use domain::{LogAction, LogEntry, Task, TaskId, TaskInput, TaskPatch, TaskStatus};
pub use registry::{Registry, RegistryError};
