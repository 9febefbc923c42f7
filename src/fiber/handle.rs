use std::any::Any;
use std::fmt;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

use super::FiberId;
use super::port::{self, Exit, Port};
use crate::config::Config;
use crate::error::FiberError;

type Entry<I, R> = Box<dyn FnOnce(I) -> R + Send>;

/// Lifecycle of a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberState {
    /// Allocated; the entry has not started.
    Created,
    /// Executing on its thread; the resumer is blocked.
    Running,
    /// Parked in [`suspend`](super::suspend).
    Suspended,
    /// Entry returned or panicked.
    Finished,
}

/// How a [`Fiber::resume`] call ended.
pub enum Resumed<Y, R> {
    /// The fiber parked in `suspend` with this value.
    Yield(Y),
    /// The entry returned this value.
    Return(R),
    /// The entry panicked; the payload is untouched so the caller can
    /// `resume_unwind` it.
    Panic(Box<dyn Any + Send>),
}

impl<Y: fmt::Debug, R: fmt::Debug> fmt::Debug for Resumed<Y, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resumed::Yield(y) => f.debug_tuple("Yield").field(y).finish(),
            Resumed::Return(r) => f.debug_tuple("Return").field(r).finish(),
            Resumed::Panic(_) => f.write_str("Panic(..)"),
        }
    }
}

/// Parts consumed when the fiber thread is spawned.
struct Pending<I, Y, R> {
    entry: Entry<I, R>,
    port: Port<I, Y, R>,
}

/// A suspendable call stack backed by a dedicated thread.
///
/// Control moves strictly one way at a time: the resumer blocks in
/// [`resume`](Fiber::resume) while the fiber runs, and the fiber blocks in
/// [`suspend`](super::suspend) while the resumer runs.
///
/// - `I`: value delivered by each `resume`
/// - `Y`: value passed out by each `suspend`
/// - `R`: value returned by the entry
pub struct Fiber<I, Y, R = ()> {
    id: FiberId,
    thread_name: String,
    stack_size: Option<usize>,
    state: Mutex<FiberState>,
    pending: Mutex<Option<Pending<I, Y, R>>>,
    resume_tx: Sender<I>,
    exit_rx: Receiver<Exit<Y, R>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl<I, Y, R> Fiber<I, Y, R>
where
    I: Send + 'static,
    Y: Send + 'static,
    R: Send + 'static,
{
    /// Allocates a fiber with the default [`Config`].
    pub fn new<F>(entry: F) -> Self
    where
        F: FnOnce(I) -> R + Send + 'static,
    {
        Self::with_config(&Config::default(), entry)
    }

    /// Allocates a fiber; no thread is spawned until the first [`resume`](Fiber::resume).
    pub fn with_config<F>(cfg: &Config, entry: F) -> Self
    where
        F: FnOnce(I) -> R + Send + 'static,
    {
        let id = FiberId::next();
        let (resume_tx, resume_rx) = bounded(1);
        let (exit_tx, exit_rx) = bounded(1);

        Self {
            id,
            thread_name: format!("{}-{}", cfg.thread_name, id.as_u64()),
            stack_size: cfg.stack_size(),
            state: Mutex::new(FiberState::Created),
            pending: Mutex::new(Some(Pending {
                entry: Box::new(entry),
                port: Port { resume_rx, exit_tx },
            })),
            resume_tx,
            exit_rx,
            thread: Mutex::new(None),
        }
    }

    /// Transfers control into the fiber until it suspends, returns or panics.
    ///
    /// On the first call `value` becomes the entry's argument; afterwards it is
    /// the result of the parked `suspend`.
    ///
    /// # Errors
    /// - [`FiberError::Dead`] if the fiber already finished
    /// - [`FiberError::Busy`] if the fiber is executing (including self-resume)
    pub fn resume(&self, value: I) -> Result<Resumed<Y, R>, FiberError> {
        {
            let mut state = self.state.lock();
            match *state {
                FiberState::Finished => return Err(FiberError::Dead),
                FiberState::Running => return Err(FiberError::Busy),
                FiberState::Created => {
                    if let Err(e) = self.start(value) {
                        *state = FiberState::Finished;
                        return Err(e);
                    }
                }
                FiberState::Suspended => {
                    if self.resume_tx.send(value).is_err() {
                        *state = FiberState::Finished;
                        return Err(FiberError::Dead);
                    }
                }
            }
            *state = FiberState::Running;
        }

        let exit = self.exit_rx.recv();

        let mut state = self.state.lock();
        let resumed = match exit {
            Ok(Exit::Yield(y)) => {
                *state = FiberState::Suspended;
                return Ok(Resumed::Yield(y));
            }
            Ok(Exit::Return(r)) => Ok(Resumed::Return(r)),
            Ok(Exit::Panic(payload)) => Ok(Resumed::Panic(payload)),
            Err(_) => Err(FiberError::Dead),
        };
        *state = FiberState::Finished;
        drop(state);

        self.reap();
        resumed
    }

    fn start(&self, first: I) -> Result<(), FiberError> {
        let Some(Pending { entry, port }) = self.pending.lock().take() else {
            return Err(FiberError::Dead);
        };

        let id = self.id;
        let mut builder = thread::Builder::new().name(self.thread_name.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        let handle = builder
            .spawn(move || port::run(id, port, entry, first))
            .map_err(|_| FiberError::Dead)?;

        *self.thread.lock() = Some(handle);
        Ok(())
    }

    /// Joins the finished fiber thread and releases it.
    fn reap(&self) {
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl<I, Y, R> Fiber<I, Y, R> {
    /// Fiber identity.
    #[inline]
    pub fn id(&self) -> FiberId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FiberState {
        *self.state.lock()
    }

    /// True until the entry returned or panicked.
    pub fn is_alive(&self) -> bool {
        self.state() != FiberState::Finished
    }
}

impl<I, Y, R> fmt::Debug for Fiber<I, Y, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("id", &self.id)
            .field("state", &*self.state.lock())
            .finish()
    }
}
