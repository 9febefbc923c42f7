//! # Consistency check: does the bound task own the executing fiber?
//!
//! Context is thread-bound and must be re-established every time control moves
//! between fibers. The check compares the fiber owned by the calling thread's
//! bound task with the fiber actually executing there:
//!
//! ```text
//! bound task fiber | running fiber | result
//! ─────────────────┼───────────────┼──────────────────────────────
//! Some(a)          | Some(a)       | ok
//! None             | None          | ok (host thread, nothing bound)
//! None             | Some(_)       | violation (fiber without task)
//! Some(a)          | Some(b)       | violation (stale binding)
//! Some(_)          | None          | violation (binding leaked to host)
//! ```
//!
//! It runs when a task's fiber starts, on entry to every `suspend`, right after
//! every `suspend` is resumed, and on entry to `terminate`.

use std::panic;

use crate::context;
use crate::error::ConsistencyViolation;
use crate::fiber;

/// Returns `true` when the calling thread's binding agrees with the executing fiber.
pub fn is_consistent() -> bool {
    diagnose().is_none()
}

/// Aborts the caller when the binding disagrees with the executing fiber.
///
/// # Panics
/// With a [`ConsistencyViolation`] payload. This is not a recoverable error: the
/// runtime's bookkeeping no longer matches what is running.
pub fn ensure_consistent() {
    if let Some(violation) = diagnose() {
        panic::panic_any(violation);
    }
}

fn diagnose() -> Option<ConsistencyViolation> {
    let bound = context::bound_task().map(|t| t.fiber);
    let running = fiber::current();
    (bound != running).then_some(ConsistencyViolation { bound, running })
}
