use crate::config::Config;
use crate::error::TaskError;
use crate::events::Bus;

use super::{Task, TaskKind};

/// Builder for a [`Task`] with optional config and event bus.
///
/// # Example
/// ```
/// use taskfiber::{Bus, Config, EventKind, Task, TaskBuilder, TaskKind, suspend};
///
/// let bus = Bus::new(16);
/// let mut rx = bus.subscribe();
///
/// let task: Task<u32> = TaskBuilder::new(TaskKind::Timer)
///     .with_config(Config { stack_size: 128 * 1024, ..Config::default() })
///     .with_bus(bus)
///     .build(|| {
///         suspend(0u32)?;
///         Ok(())
///     });
///
/// task.resume(1).unwrap();
/// task.terminate().unwrap();
/// assert!(!task.running());
/// assert_eq!(rx.try_recv().unwrap().kind, EventKind::TaskCreated);
/// ```
pub struct TaskBuilder {
    kind: TaskKind,
    cfg: Config,
    bus: Option<Bus>,
}

impl TaskBuilder {
    /// Creates a new builder with the default configuration.
    pub fn new(kind: impl Into<TaskKind>) -> Self {
        Self {
            kind: kind.into(),
            cfg: Config::default(),
            bus: None,
        }
    }

    /// Sets the fiber configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Publishes the task's lifecycle events on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the task. The body does not run until the first resume.
    pub fn build<V, F>(self, body: F) -> Task<V>
    where
        V: Send + 'static,
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        Task::create(self.kind, &self.cfg, self.bus, body)
    }
}
