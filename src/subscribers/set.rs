//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to multiple subscribers
//! without blocking the publishing task.
//!
//! ## Architecture
//! ```text
//! Bus ──► listener thread ──► emit(event)
//!                                 │
//!                                 ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!                                 │    (bounded)         └──────► panic → SubscriberPanicked
//!                                 ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!                                 └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: slow/panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! ## Panic handling
//! Workers use `catch_unwind` to isolate panics:
//! - Panic is caught and converted to `SubscriberPanicked` event
//! - Worker continues processing next event
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Sender, TrySendError, bounded};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Mutex<Vec<SubscriberChannel>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker thread per subscriber.
    ///
    /// ### Per-subscriber setup
    /// - Bounded queue (capacity from [`Subscribe::queue_capacity`], min 1)
    /// - Dedicated worker thread (runs until the queue is closed)
    /// - Panic isolation via `catch_unwind`
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Arc<Self> {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, rx) = bounded::<Arc<Event>>(cap);
            let bus_for_worker = bus.clone();

            let spawned = thread::Builder::new()
                .name(format!("subscriber-{name}"))
                .spawn(move || {
                    for ev in rx {
                        let res = panic::catch_unwind(AssertUnwindSafe(|| sub.on_event(&ev)));
                        if let Err(payload) = res {
                            bus_for_worker
                                .publish(Event::subscriber_panicked(name, panic_message(&*payload)));
                        }
                    }
                });
            match spawned {
                Ok(handle) => {
                    channels.push(SubscriberChannel { name, sender: tx });
                    workers.push(handle);
                }
                Err(_) => bus.publish(Event::subscriber_overflow(name, "spawn_failed")),
            }
        }
        Arc::new(Self {
            channels: Mutex::new(channels),
            workers: Mutex::new(workers),
            bus,
        })
    }

    /// Spawns a thread forwarding every event published on the set's bus.
    ///
    /// The listener holds the set weakly: it exits once the set is dropped or shut
    /// down (observed on the next event), or once every `Bus` clone is gone.
    pub fn listen(self: &Arc<Self>) -> std::io::Result<JoinHandle<()>> {
        let mut rx = self.bus.subscribe();
        let set: Weak<Self> = Arc::downgrade(self);

        thread::Builder::new()
            .name("subscriber-listener".into())
            .spawn(move || {
                loop {
                    let ev = match rx.blocking_recv() {
                        Ok(ev) => ev,
                        Err(RecvError::Lagged(_)) => Event::subscriber_overflow("listener", "lagged"),
                        Err(RecvError::Closed) => break,
                    };
                    let Some(strong) = set.upgrade() else { break };
                    if strong.is_closed() {
                        break;
                    }
                    strong.emit_arc(Arc::new(ev));
                }
            })
    }

    /// Emits an event to all subscribers (clones the event).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated `Arc<Event>` to all subscribers.
    ///
    /// - Uses `try_send` (non-blocking)
    /// - On queue full: drops event, publishes `SubscriberOverflow`
    /// - On queue closed: publishes `SubscriberOverflow` with reason "closed"
    ///
    /// `SubscriberOverflow` events are not re-published if they themselves overflow.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in self.channels.lock().iter() {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "full"));
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }

    /// Shuts down all subscriber workers.
    ///
    /// 1. Drops all channel senders (workers see the queue closed)
    /// 2. Joins all worker threads (queued events are still delivered)
    pub fn shutdown(&self) {
        drop(std::mem::take(&mut *self.channels.lock()));

        let workers = std::mem::take(&mut *self.workers.lock());
        for h in workers {
            let _ = h.join();
        }
    }

    fn is_closed(&self) -> bool {
        self.channels.lock().is_empty()
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(v) = payload.downcast_ref::<crate::ConsistencyViolation>() {
        v.to_string()
    } else {
        "unknown panic".to_string()
    }
}
