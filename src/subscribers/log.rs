//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [created] task=3 kind="call"
//! [starting] task=3 kind="call"
//! [suspended] task=3 kind="call"
//! [resumed] task=3 kind="call"
//! [killed] task=3 kind="call"
//! [failed] task=4 kind="timer" err="task failed: boom"
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn line(e: &Event) -> String {
        let task = e.task.unwrap_or_default();
        let kind = e.kind_label.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::TaskCreated => format!("[created] task={task} kind={kind:?}"),
            EventKind::TaskStarting => format!("[starting] task={task} kind={kind:?}"),
            EventKind::TaskResumed => format!("[resumed] task={task} kind={kind:?}"),
            EventKind::TaskSuspended => format!("[suspended] task={task} kind={kind:?}"),
            EventKind::TaskStopped => format!("[stopped] task={task} kind={kind:?}"),
            EventKind::TaskKilled => format!("[killed] task={task} kind={kind:?}"),
            EventKind::TaskFailed => format!(
                "[failed] task={task} kind={kind:?} err={:?}",
                e.reason.as_deref().unwrap_or("unknown")
            ),
            EventKind::SubscriberOverflow => format!(
                "[subscriber-overflow] {}",
                e.reason.as_deref().unwrap_or("unknown")
            ),
            EventKind::SubscriberPanicked => format!(
                "[subscriber-panicked] {}",
                e.reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        println!("{}", Self::line(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
