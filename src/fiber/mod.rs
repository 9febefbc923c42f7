//! # Fiber: the coroutine primitive under every task.
//!
//! A [`Fiber`] is a suspendable call stack. Each fiber runs on its own thread,
//! spawned lazily by the first [`Fiber::resume`], and hands control back and forth
//! with its resumer over two rendezvous channels, so exactly one side executes at
//! any instant.
//!
//! ## Hand-off
//! ```text
//! resumer thread                          fiber thread
//! ──────────────                          ────────────
//! resume(v) ──── resume_tx ────────────►  entry(v) / suspend() returns v
//!    │ (blocked)                               │ (runs)
//!    ◄────────── exit_tx ───────────────  suspend(y) → Exit::Yield(y)
//!    ◄────────── exit_tx ───────────────  entry returns r → Exit::Return(r)
//!    ◄────────── exit_tx ───────────────  entry panics → Exit::Panic(payload)
//! ```
//!
//! ## Rules
//! - The entry does **not** run before the first `resume`.
//! - `resume` on a finished fiber fails with [`FiberError::Dead`](crate::FiberError::Dead);
//!   on a running one with [`FiberError::Busy`](crate::FiberError::Busy).
//! - [`current`] identifies the fiber executing on the calling thread.
//! - Dropping the handle of a parked fiber closes its resume channel; the parked
//!   stack unwinds (destructors run) and the thread exits without a panic report.

mod handle;
mod id;
mod port;

pub use handle::{Fiber, FiberState, Resumed};
pub use id::FiberId;
pub use port::{current, suspend};
