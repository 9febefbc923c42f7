//! # Lifecycle events emitted by tasks.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Task lifecycle events**: creation, start, suspend/resume hand-offs, terminal states
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task id,
//! task kind and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskfiber::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task(7)
//!     .with_kind_label("call")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task, Some(7));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full, worker closed or bus lagged).
    ///
    /// Sets:
    /// - `reason`: subscriber name and reason (e.g., "full", "closed", "lagged")
    SubscriberOverflow,

    // === Task lifecycle events ===
    /// Task was constructed; its fiber has not started yet.
    ///
    /// Sets:
    /// - `task`, `kind_label`
    TaskCreated,

    /// First resume; the body is about to run.
    ///
    /// Sets:
    /// - `task`, `kind_label`
    TaskStarting,

    /// A parked task was resumed.
    ///
    /// Sets:
    /// - `task`, `kind_label`
    TaskResumed,

    /// The body parked itself in `suspend`.
    ///
    /// Sets:
    /// - `task`, `kind_label`
    TaskSuspended,

    /// The body returned normally.
    ///
    /// Sets:
    /// - `task`, `kind_label`
    TaskStopped,

    /// The body was terminated via the termination sentinel.
    ///
    /// Sets:
    /// - `task`, `kind_label`
    TaskKilled,

    /// The body returned an error or panicked.
    ///
    /// Sets:
    /// - `task`, `kind_label`
    /// - `reason`: error or panic message
    TaskFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Id of the task, if applicable.
    pub task: Option<u64>,
    /// Label of the task kind (e.g. "call", "timer").
    pub kind_label: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            reason: None,
            task: None,
            kind_label: None,
            kind,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: u64) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches a task kind label.
    #[inline]
    pub fn with_kind_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.kind_label = Some(label.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for subscriber overflow events.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// True for the three terminal task events.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::TaskStopped | EventKind::TaskKilled | EventKind::TaskFailed
        )
    }
}
