//! # taskfiber
//!
//! **Taskfiber** provides the resumable execution contexts that an actor runtime
//! schedules: a [`Task`] runs a body on its own fiber, parks itself with
//! [`suspend`], and is driven from outside with [`Task::resume`] and
//! [`Task::terminate`].
//!
//! Every execution context carries a binding (current task, owning actor, mailbox).
//! A task captures the actor and mailbox of the thread that created it and
//! re-installs them when its fiber starts, so the body sees the same context no
//! matter which host thread resumes it. [`ensure_consistent`] aborts when the
//! binding and the executing fiber disagree.
//!
//! ## Architecture
//! ```text
//!   host scheduler thread(s)
//! ┌──────────────────────────────────────────────────────────────┐
//! │  context::enter(actor, mailbox)                              │
//! │  Task::new(kind, body) ──► captures (actor, mailbox)         │
//! │  task.resume(v) ─┐          task.terminate() ─┐              │
//! └──────────────────┼────────────────────────────┼──────────────┘
//!                    ▼                            ▼ (sentinel)
//!   ┌────────────────────────────────────────────────────────────┐
//!   │  Fiber (own thread, lazily spawned, rendezvous hand-off)   │
//!   │   entry: install binding ─► ensure_consistent ─► body()    │
//!   │   body:  suspend(y) ◄──── parks, returns next resume value │
//!   │          Err(Terminated) ─► cleanup ─► Killed              │
//!   └─────────────────────┬──────────────────────────────────────┘
//!                         │ Task publishes lifecycle events
//!                         ▼
//!   ┌────────────────────────────────────────────────────────────┐
//!   │  Bus (broadcast) ──► SubscriberSet ──► worker per Subscribe│
//!   └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / functions                        |
//! |-------------------|--------------------------------------------------------------|----------------------------------------------|
//! | **Tasks**         | Create, resume, suspend and terminate cooperative tasks.     | [`Task`], [`TaskBuilder`], [`suspend`]       |
//! | **Context**       | Per-thread actor/mailbox binding captured by tasks.          | [`context::enter`], [`ActorRef`]             |
//! | **Consistency**   | Fatal check that the binding matches the running fiber.      | [`ensure_consistent`], [`is_consistent`]     |
//! | **Fibers**        | The underlying suspendable call stack.                       | [`fiber::Fiber`]                             |
//! | **Subscriber API**| Hook into task lifecycle events.                             | [`Subscribe`], [`SubscriberSet`], [`Bus`]    |
//! | **Errors**        | Typed errors for task operations.                            | [`TaskError`], [`FiberError`]                |
//! | **Configuration** | Fiber stack size, thread names, bus capacity.                | [`Config`]                                   |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use taskfiber::context::{self, ActorRef, MailboxRef};
//! use taskfiber::{Step, Task, TaskError, TaskKind, suspend};
//!
//! let _ctx = context::enter(
//!     Some(ActorRef::new("greeter")),
//!     Some(MailboxRef::new(Vec::<String>::new())),
//! );
//!
//! let task: Task<i32> = Task::new(TaskKind::Call, || {
//!     assert!(context::current_actor().is_some());
//!     let mut total: i32 = 0;
//!     loop {
//!         match suspend(total) {
//!             Ok(n) => total += n,
//!             Err(TaskError::Terminated) => {
//!                 // cleanup runs before terminate() returns
//!                 return Err(TaskError::Terminated);
//!             }
//!             Err(e) => return Err(e),
//!         }
//!     }
//! });
//!
//! assert_eq!(task.step(0), Ok(Step::Suspended(0)));
//! assert_eq!(task.step(4), Ok(Step::Suspended(4)));
//! assert_eq!(task.step(6), Ok(Step::Suspended(10)));
//!
//! task.terminate().unwrap();
//! assert!(!task.running());
//! assert_eq!(task.resume(1), Err(TaskError::DeadTask));
//! ```
mod config;
mod error;
mod events;
mod subscribers;
mod tasks;

pub mod context;
pub mod fiber;

// ---- Public re-exports ----

pub use config::Config;
pub use context::{ActorRef, MailboxRef};
pub use error::{ConsistencyViolation, FiberError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    Step, Task, TaskBuilder, TaskExit, TaskId, TaskKind, TaskState, ensure_consistent,
    is_consistent, suspend,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
