//! Fiber-side half of the hand-off: thread-locals, `suspend`, and the thread main.

use std::any::{Any, type_name};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{Receiver, Sender};

use super::FiberId;
use crate::error::FiberError;

/// Message from the fiber thread back to its resumer.
pub(crate) enum Exit<Y, R> {
    Yield(Y),
    Return(R),
    Panic(Box<dyn Any + Send>),
}

/// Channel ends owned by the fiber thread.
pub(crate) struct Port<I, Y, R> {
    pub(crate) resume_rx: Receiver<I>,
    pub(crate) exit_tx: Sender<Exit<Y, R>>,
}

/// Panic payload that unwinds a parked fiber whose handle was dropped.
struct Unwound;

thread_local! {
    static CURRENT: Cell<Option<FiberId>> = const { Cell::new(None) };
    static PORT: RefCell<Option<Box<dyn Any>>> = const { RefCell::new(None) };
}

/// Returns the fiber executing on the calling thread, or `None` on a host thread.
pub fn current() -> Option<FiberId> {
    CURRENT.with(Cell::get)
}

/// Yields `value` to the resumer and blocks until the fiber is resumed again.
///
/// `I`, `Y` and `R` must be exactly the parameters of the running [`Fiber`](super::Fiber).
///
/// # Errors
/// - [`FiberError::NotInFiber`] on a thread that is not driving a fiber
/// - [`FiberError::Signature`] when the types do not match the running fiber
///
/// If the fiber's handle is dropped while parked, this call does not return:
/// the fiber's stack is unwound silently and its thread exits.
pub fn suspend<I, Y, R>(value: Y) -> Result<I, FiberError>
where
    I: 'static,
    Y: 'static,
    R: 'static,
{
    PORT.with(|slot| {
        let slot = slot.borrow();
        let port = slot
            .as_ref()
            .ok_or(FiberError::NotInFiber)?
            .downcast_ref::<Port<I, Y, R>>()
            .ok_or(FiberError::Signature {
                expected: type_name::<(I, Y, R)>(),
            })?;

        if port.exit_tx.send(Exit::Yield(value)).is_err() {
            panic::resume_unwind(Box::new(Unwound));
        }
        match port.resume_rx.recv() {
            Ok(value) => Ok(value),
            Err(_) => panic::resume_unwind(Box::new(Unwound)),
        }
    })
}

/// Thread main of a fiber: binds the port, runs the entry, reports how it ended.
pub(crate) fn run<I, Y, R>(
    id: FiberId,
    port: Port<I, Y, R>,
    entry: Box<dyn FnOnce(I) -> R + Send>,
    first: I,
) where
    I: 'static,
    Y: 'static,
    R: 'static,
{
    CURRENT.with(|c| c.set(Some(id)));
    let exit_tx = port.exit_tx.clone();
    PORT.with(|slot| *slot.borrow_mut() = Some(Box::new(port)));

    let outcome = panic::catch_unwind(AssertUnwindSafe(move || entry(first)));

    PORT.with(|slot| slot.borrow_mut().take());
    CURRENT.with(|c| c.set(None));

    let exit = match outcome {
        Ok(ret) => Exit::Return(ret),
        Err(payload) if payload.is::<Unwound>() => return,
        Err(payload) => Exit::Panic(payload),
    };
    let _ = exit_tx.send(exit);
}
