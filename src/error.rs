//! Error types used by tasks and the fiber primitive.
//!
//! This module defines:
//!
//! - [`TaskError`]: errors surfaced by task operations and task bodies.
//! - [`FiberError`]: errors raised by the underlying [`Fiber`](crate::fiber::Fiber).
//! - [`ConsistencyViolation`]: the fatal payload of a broken current-task binding.
//!
//! `TaskError` provides helper methods (`as_label`, `as_message`) for logging/events.
//!
//! `ConsistencyViolation` is deliberately **not** a variant of `TaskError`: it is raised
//! with [`std::panic::panic_any`] and never returned, because it signals that the
//! runtime's bookkeeping no longer matches what is executing.

use thiserror::Error;

use crate::fiber::FiberId;

/// # Errors produced by task operations.
///
/// `DeadTask`, `AlreadyRunning` and `NotInTaskScope` are raised by the task machinery.
/// `Terminated` is raised by [`suspend`](crate::suspend) inside a body that is being terminated.
/// `Fail` is the conventional way for a body to report its own failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task has already finished, faulted or been killed.
    #[error("cannot resume a dead task")]
    DeadTask,

    /// The task is executing right now (e.g. a body tried to resume itself).
    #[error("task is already running")]
    AlreadyRunning,

    /// The task was terminated while parked in `suspend`.
    #[error("task was terminated")]
    Terminated,

    /// No task is bound to the calling thread.
    #[error("not in task scope")]
    NotInTaskScope,

    /// The bound task exchanges values of a different type.
    #[error("current task does not exchange values of type {expected}")]
    ValueMismatch {
        /// Type name that was requested.
        expected: &'static str,
    },

    /// The task body failed.
    #[error("task failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Creates a body failure from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use taskfiber::TaskError;
    ///
    /// assert_eq!(TaskError::DeadTask.as_label(), "task_dead");
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::DeadTask => "task_dead",
            TaskError::AlreadyRunning => "task_already_running",
            TaskError::Terminated => "task_terminated",
            TaskError::NotInTaskScope => "task_not_in_scope",
            TaskError::ValueMismatch { .. } => "task_value_mismatch",
            TaskError::Fail { .. } => "task_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::DeadTask => "dead task".to_string(),
            TaskError::AlreadyRunning => "already running".to_string(),
            TaskError::Terminated => "terminated".to_string(),
            TaskError::NotInTaskScope => "not in task scope".to_string(),
            TaskError::ValueMismatch { expected } => format!("value mismatch: {expected}"),
            TaskError::Fail { error } => format!("error: {error}"),
        }
    }

    /// True for [`TaskError::DeadTask`].
    pub fn is_dead(&self) -> bool {
        matches!(self, TaskError::DeadTask)
    }

    /// True for [`TaskError::Terminated`].
    ///
    /// Bodies that catch termination to run cleanup should check this and
    /// re-raise it afterwards.
    pub fn is_terminated(&self) -> bool {
        matches!(self, TaskError::Terminated)
    }
}

impl From<FiberError> for TaskError {
    fn from(err: FiberError) -> Self {
        match err {
            FiberError::Dead => TaskError::DeadTask,
            FiberError::Busy => TaskError::AlreadyRunning,
            FiberError::NotInFiber => TaskError::NotInTaskScope,
            FiberError::Signature { expected } => TaskError::ValueMismatch { expected },
        }
    }
}

/// # Errors produced by the fiber primitive.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberError {
    /// The fiber's entry already returned or panicked.
    #[error("dead fiber called")]
    Dead,

    /// The fiber is currently executing.
    #[error("double resume")]
    Busy,

    /// `suspend` was called on a thread that is not driving a fiber.
    #[error("can't yield from root fiber")]
    NotInFiber,

    /// `suspend` was called with types that do not match the running fiber.
    #[error("fiber does not exchange {expected}")]
    Signature {
        /// Type signature that was requested.
        expected: &'static str,
    },
}

/// # Fatal mismatch between the bound task and the executing fiber.
///
/// Raised as a panic payload by [`ensure_consistent`](crate::tasks::ensure_consistent).
/// Recover it with `payload.downcast_ref::<ConsistencyViolation>()`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("current task binding is wrong: bound={bound:?} running={running:?}")]
pub struct ConsistencyViolation {
    /// Fiber of the task bound to the calling thread.
    pub bound: Option<FiberId>,
    /// Fiber actually executing on the calling thread.
    pub running: Option<FiberId>,
}
