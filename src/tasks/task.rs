//! # Task: a resumable, terminable unit of cooperative work.
//!
//! A [`Task`] wraps one [`Fiber`] running a body. The host scheduler drives it
//! from outside with [`resume`](Task::resume) / [`terminate`](Task::terminate);
//! the body parks itself with [`suspend`].
//!
//! ## State machine
//! ```text
//! Created ──resume──► Running ──suspend──► Suspended ──resume──► Running ...
//!                        │
//!                        ├─ body returns Ok            ─► Terminated(Normal)
//!                        ├─ body returns Err / panics  ─► Terminated(Faulted)
//!                        └─ body returns Terminated    ─► Terminated(Killed)
//!
//! Terminated is absorbing: resume ─► Err(DeadTask), terminate ─► Ok(())
//! ```
//!
//! ## Termination
//! `terminate` delivers a sentinel through the ordinary resume channel. The parked
//! `suspend` observes it and fails with [`TaskError::Terminated`]; the body may
//! run cleanup and should propagate it with `?`. The entry wrapper swallows it.
//! A task terminated before it ever started is marked Killed without running its body.
//!
//! ## Rules
//! - Every hand-off is synchronous: when `resume` returns, the task has
//!   suspended again, finished or faulted.
//! - Resumes of one task must be serialized by the caller; a concurrent resume
//!   observes [`TaskError::AlreadyRunning`].
//! - Values produced by the task go through side channels (the mailbox);
//!   [`step`](Task::step) exposes the value passed to `suspend` for schedulers
//!   that want it.

use std::any::{Any, type_name};
use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{TaskBuilder, TaskKind, ensure_consistent};
use crate::config::Config;
use crate::context::{self, ActorRef, Binding, BoundTask, MailboxRef};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::fiber::{self, Fiber, FiberId, FiberState, Resumed};
use crate::subscribers::panic_message;

/// Global task id allocator (0 is never handed out).
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique task identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// How a task reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// The body returned `Ok(())`.
    Normal,
    /// The body returned an error or panicked.
    Faulted,
    /// The termination sentinel was delivered and swallowed.
    Killed,
}

/// Observable lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Constructed; the body has not started.
    Created,
    /// The body is executing.
    Running,
    /// Parked in [`suspend`].
    Suspended,
    /// Finished; can never be resumed again.
    Terminated(TaskExit),
}

/// Result of [`Task::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<V> {
    /// The body parked in `suspend` with this value.
    Suspended(V),
    /// The body finished normally or was killed.
    Finished,
}

/// Value travelling through the resume channel.
pub(crate) enum Signal<V> {
    Value(V),
    Terminate,
}

/// What the entry wrapper returns to the resumer.
pub(crate) type Outcome = Result<TaskExit, TaskError>;

struct Inner<V> {
    id: TaskId,
    kind: TaskKind,
    fiber: Fiber<Signal<V>, V, Outcome>,
    exit: Mutex<Option<TaskExit>>,
    bus: Option<Bus>,
}

/// Handle to a task. Cloning is cheap and yields another handle to the same task.
///
/// `V` is the type exchanged by `resume` and `suspend`.
pub struct Task<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Task<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + 'static> Task<V> {
    /// Creates a task with the default [`Config`] and no event bus.
    ///
    /// Use [`TaskBuilder`] to attach a config or an event bus.
    ///
    /// Captures the calling thread's actor and mailbox. The body does not run
    /// until the first [`resume`](Task::resume).
    pub fn new<F>(kind: impl Into<TaskKind>, body: F) -> Self
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        TaskBuilder::new(kind).build(body)
    }

    pub(crate) fn create<F>(kind: TaskKind, cfg: &Config, bus: Option<Bus>, body: F) -> Self
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        let (actor, mailbox) = context::ambient();
        let id = TaskId::next();

        let inner = Arc::new_cyclic(|me: &Weak<Inner<V>>| {
            let me = me.clone();
            Inner {
                id,
                kind,
                fiber: Fiber::with_config(cfg, move |start| entry(me, actor, mailbox, start, body)),
                exit: Mutex::new(None),
                bus,
            }
        });

        let task = Self { inner };
        task.publish(EventKind::TaskCreated, None);
        task
    }

    /// Returns the task bound to the calling thread.
    ///
    /// # Errors
    /// - [`TaskError::NotInTaskScope`] outside a task body
    /// - [`TaskError::ValueMismatch`] if the bound task does not exchange `V`
    ///
    /// # Panics
    /// With a [`ConsistencyViolation`](crate::ConsistencyViolation) if the binding
    /// does not match the executing fiber.
    pub fn current() -> Result<Self, TaskError> {
        let bound = context::bound_task().ok_or(TaskError::NotInTaskScope)?;
        ensure_consistent();

        let any = bound.handle.upgrade().ok_or(TaskError::NotInTaskScope)?;
        let inner = any
            .downcast::<Inner<V>>()
            .map_err(|_| TaskError::ValueMismatch {
                expected: type_name::<V>(),
            })?;
        Ok(Self { inner })
    }

    /// Resumes the task, delivering `value` to its parked `suspend`.
    ///
    /// # Errors
    /// - [`TaskError::DeadTask`] if the task already finished, faulted or was killed
    /// - [`TaskError::AlreadyRunning`] if the task is executing right now
    /// - any other error returned by the body, unchanged
    ///
    /// # Panics
    /// Re-raises a panic from the body with its original payload.
    pub fn resume(&self, value: V) -> Result<(), TaskError> {
        self.step(value).map(|_| ())
    }

    /// Like [`resume`](Task::resume), but reports the value the body passed to `suspend`.
    pub fn step(&self, value: V) -> Result<Step<V>, TaskError> {
        self.deliver(Signal::Value(value))
    }

    /// Terminates the task at its current suspension point.
    ///
    /// Cleanup code in the body runs before this returns. Terminating a task that
    /// already finished is a no-op.
    ///
    /// # Errors
    /// Errors raised by the body's cleanup, and [`TaskError::AlreadyRunning`]
    /// when called from inside the task itself.
    ///
    /// # Panics
    /// With a [`ConsistencyViolation`](crate::ConsistencyViolation) if the calling
    /// thread's binding is inconsistent.
    pub fn terminate(&self) -> Result<(), TaskError> {
        ensure_consistent();
        match self.deliver(Signal::Terminate) {
            Ok(_) | Err(TaskError::DeadTask) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn deliver(&self, signal: Signal<V>) -> Result<Step<V>, TaskError> {
        let event = match self.inner.fiber.state() {
            FiberState::Finished => return Err(TaskError::DeadTask),
            FiberState::Running => return Err(TaskError::AlreadyRunning),
            FiberState::Created => EventKind::TaskStarting,
            FiberState::Suspended => EventKind::TaskResumed,
        };
        self.publish(event, None);

        match self.inner.fiber.resume(signal)? {
            Resumed::Yield(value) => {
                self.publish(EventKind::TaskSuspended, None);
                Ok(Step::Suspended(value))
            }
            Resumed::Return(Ok(exit)) => {
                self.finish(exit, None);
                Ok(Step::Finished)
            }
            Resumed::Return(Err(e)) => {
                self.finish(TaskExit::Faulted, Some(e.to_string()));
                Err(e)
            }
            Resumed::Panic(payload) => {
                self.finish(TaskExit::Faulted, Some(panic_message(&*payload)));
                panic::resume_unwind(payload)
            }
        }
    }

    fn finish(&self, exit: TaskExit, reason: Option<String>) {
        *self.inner.exit.lock() = Some(exit);
        let event = match exit {
            TaskExit::Normal => EventKind::TaskStopped,
            TaskExit::Killed => EventKind::TaskKilled,
            TaskExit::Faulted => EventKind::TaskFailed,
        };
        self.publish(event, reason);
    }
}

impl<V> Task<V> {
    /// Task identity.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    /// What this task is for.
    #[inline]
    pub fn kind(&self) -> &TaskKind {
        &self.inner.kind
    }

    /// True until the body completes, faults or is killed.
    pub fn running(&self) -> bool {
        self.inner.fiber.is_alive()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        match self.inner.fiber.state() {
            FiberState::Created => TaskState::Created,
            FiberState::Running => TaskState::Running,
            FiberState::Suspended => TaskState::Suspended,
            FiberState::Finished => {
                TaskState::Terminated(self.inner.exit.lock().unwrap_or(TaskExit::Faulted))
            }
        }
    }

    /// Fiber owned by this task.
    pub fn fiber_id(&self) -> FiberId {
        self.inner.fiber.id()
    }

    /// True if both handles refer to the same task.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn publish(&self, kind: EventKind, reason: Option<String>) {
        if let Some(bus) = &self.inner.bus {
            let mut ev = Event::new(kind)
                .with_task(self.inner.id.as_u64())
                .with_kind_label(self.inner.kind.as_label());
            if let Some(reason) = reason {
                ev = ev.with_reason(reason);
            }
            bus.publish(ev);
        }
    }
}

impl<V> fmt::Debug for Task<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("running", &self.running())
            .finish()
    }
}

/// Parks the calling task, handing `value` to whoever resumed it.
///
/// Returns the value delivered by the next [`Task::resume`].
///
/// # Errors
/// - [`TaskError::Terminated`] if the task is being terminated; propagate it with `?`
/// - [`TaskError::NotInTaskScope`] outside a task body
/// - [`TaskError::ValueMismatch`] if the task does not exchange `V`
///
/// # Panics
/// With a [`ConsistencyViolation`](crate::ConsistencyViolation) if the binding
/// does not match the executing fiber, before parking or after being resumed.
pub fn suspend<V: Send + 'static>(value: V) -> Result<V, TaskError> {
    // The handle is released before parking so that dropping every outside
    // handle can still unwind this fiber.
    drop(Task::<V>::current()?);

    let signal = fiber::suspend::<Signal<V>, V, Outcome>(value)?;
    #[cfg(test)]
    context::apply_rebind();
    ensure_consistent();

    match signal {
        Signal::Value(value) => Ok(value),
        Signal::Terminate => Err(TaskError::Terminated),
    }
}

/// Fiber entry of every task.
fn entry<V, F>(
    me: Weak<Inner<V>>,
    actor: Option<ActorRef>,
    mailbox: Option<MailboxRef>,
    start: Signal<V>,
    body: F,
) -> Outcome
where
    V: Send + 'static,
    F: FnOnce() -> Result<(), TaskError>,
{
    let Some(task) = me.upgrade() else {
        return Ok(TaskExit::Killed);
    };
    let fiber = task.fiber.id();
    drop(task);

    context::install(Binding {
        task: Some(BoundTask {
            fiber,
            handle: me.clone() as Weak<dyn Any + Send + Sync>,
        }),
        actor,
        mailbox,
    });
    #[cfg(test)]
    context::apply_rebind();
    ensure_consistent();

    let outcome = match start {
        Signal::Terminate => Ok(TaskExit::Killed),
        Signal::Value(_) => match body() {
            Ok(()) => Ok(TaskExit::Normal),
            Err(TaskError::Terminated) => Ok(TaskExit::Killed),
            Err(e) => Err(e),
        },
    };

    // Recorded before the resumer sees the fiber finish.
    if let Some(task) = me.upgrade() {
        *task.exit.lock() = Some(outcome.as_ref().map_or(TaskExit::Faulted, |exit| *exit));
    }
    outcome
}
