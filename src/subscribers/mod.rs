//! # Event subscribers for task lifecycle events.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that delivers events broadcast through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Task ── publish(Event) ──► Bus ──► SubscriberSet::listen
//!                                         │
//!                                    ┌────┴────┬─────────┐
//!                                    ▼         ▼         ▼
//!                                LogWriter  Metrics   Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use taskfiber::{Event, EventKind, Subscribe};
//!
//! struct Killed;
//!
//! impl Subscribe for Killed {
//!     fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskKilled {
//!             // count forced shutdowns
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
