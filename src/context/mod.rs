//! # Execution-context-local binding.
//!
//! Every thread carries a binding `(current_task, owning_actor, mailbox)`.
//! The host runtime sets actor/mailbox on its own threads with [`enter`]; a task
//! captures them at construction and re-installs them, together with itself as
//! the current task, when its fiber starts.
//!
//! ```text
//! host thread                         fiber thread (task T)
//! ───────────                         ─────────────────────
//! enter(actor, mailbox)
//! Task::new(kind, body) ── capture ─► entry: install(T, actor, mailbox)
//!                                            ensure_consistent()
//!                                            body()
//! ```

mod binding;
mod handle;

pub(crate) use binding::{Binding, BoundTask, ambient, bound_task, install};
#[cfg(test)]
pub(crate) use binding::{apply_rebind, rebind_on_resume};
pub use binding::{ContextGuard, current_actor, current_mailbox, enter};
pub use handle::{ActorRef, MailboxRef};
