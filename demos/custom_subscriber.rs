//! # Example: custom_subscriber
//!
//! Demonstrates how to observe task lifecycle events.
//!
//! Shows how to:
//! - Publish a task's events on a [`Bus`] via [`TaskBuilder::with_bus`].
//! - Fan them out to subscribers with [`SubscriberSet`].
//! - Implement [`Subscribe`] (and, with `--features logging`, add [`LogWriter`]).
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! cargo run --example custom_subscriber --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use taskfiber::{
    Bus, Config, Event, EventKind, Subscribe, SubscriberSet, Task, TaskBuilder, TaskKind, suspend,
};

/// Counts how tasks ended.
#[derive(Default)]
struct Tally {
    stopped: AtomicUsize,
    killed: AtomicUsize,
    failed: AtomicUsize,
}

impl Subscribe for Tally {
    fn on_event(&self, event: &Event) {
        let slot = match event.kind {
            EventKind::TaskStopped => &self.stopped,
            EventKind::TaskKilled => &self.killed,
            EventKind::TaskFailed => &self.failed,
            _ => return,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== custom_subscriber example ===\n");

    let cfg = Config::default();
    let bus = Bus::new(cfg.bus_capacity_clamped());

    let tally = Arc::new(Tally::default());
    #[allow(unused_mut)]
    let mut subs: Vec<Arc<dyn Subscribe>> = vec![tally.clone()];
    #[cfg(feature = "logging")]
    subs.push(Arc::new(taskfiber::LogWriter::new()));

    let set = SubscriberSet::new(subs, bus.clone());
    let listener = set.listen()?;

    // One task finishes, one is killed, one fails.
    let builder = || TaskBuilder::new(TaskKind::Timer).with_bus(bus.clone());
    let done: Task<()> = builder().build(|| Ok(()));
    let killed: Task<()> = builder().build(|| {
        suspend(())?;
        Ok(())
    });
    let failed: Task<()> = builder().build(|| Err(taskfiber::TaskError::fail("boom")));

    done.resume(())?;
    killed.resume(())?;
    killed.terminate()?;
    let _ = failed.resume(());

    // Let the listener and workers drain.
    thread::sleep(Duration::from_millis(100));
    set.shutdown();
    drop(set);
    drop((done, killed, failed, bus));
    let _ = listener.join();

    println!(
        "\n[tally] stopped={} killed={} failed={}",
        tally.stopped.load(Ordering::Relaxed),
        tally.killed.load(Ordering::Relaxed),
        tally.failed.load(Ordering::Relaxed),
    );
    Ok(())
}
