//! # Tasks: resumable execution contexts for actor runtimes.
//!
//! This module provides the task-related types:
//! - [`Task`] - handle to one unit of work running on its own fiber
//! - [`TaskBuilder`] - attaches config and event bus
//! - [`TaskKind`] - what the task is for
//! - [`suspend`] - parks the calling task
//! - [`is_consistent`] / [`ensure_consistent`] - the current-task invariant

mod builder;
mod check;
mod kind;
mod task;

pub use builder::TaskBuilder;
pub use check::{ensure_consistent, is_consistent};
pub use kind::TaskKind;
pub use task::{Step, Task, TaskExit, TaskId, TaskState, suspend};

#[cfg(test)]
mod tests;
