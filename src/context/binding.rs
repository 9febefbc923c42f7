//! Per-thread binding of `(current_task, owning_actor, mailbox)`.
//!
//! ## Writers
//! - The task entry point, once, on its own fiber thread (`install`).
//! - The host runtime on its own threads, via [`enter`] (actor/mailbox only).
//!
//! Nothing ever writes another thread's binding: a fiber gets a fresh thread, so
//! the creator's context is captured at construction and re-installed at start.

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Weak;

use super::{ActorRef, MailboxRef};
use crate::fiber::FiberId;

/// The task bound to a thread.
#[derive(Clone)]
pub(crate) struct BoundTask {
    /// Fiber owned by the bound task (what *should* be executing).
    pub(crate) fiber: FiberId,
    /// Type-erased `Weak<Inner<V>>` of the bound task.
    pub(crate) handle: Weak<dyn Any + Send + Sync>,
}

#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) task: Option<BoundTask>,
    pub(crate) actor: Option<ActorRef>,
    pub(crate) mailbox: Option<MailboxRef>,
}

impl Binding {
    const EMPTY: Binding = Binding {
        task: None,
        actor: None,
        mailbox: None,
    };
}

thread_local! {
    static BINDING: RefCell<Binding> = const { RefCell::new(Binding::EMPTY) };
}

/// Replaces the calling thread's binding, returning the previous one.
pub(crate) fn install(binding: Binding) -> Binding {
    BINDING.with(|b| b.replace(binding))
}

/// Bindings that fibers pick up the next time they take control, keyed by fiber.
#[cfg(test)]
static PENDING_REBIND: parking_lot::Mutex<Vec<(FiberId, Binding)>> =
    parking_lot::Mutex::new(Vec::new());

/// Makes `fiber` install `binding` when it next starts or returns from a suspension.
#[cfg(test)]
pub(crate) fn rebind_on_resume(fiber: FiberId, binding: Binding) {
    PENDING_REBIND.lock().push((fiber, binding));
}

#[cfg(test)]
pub(crate) fn apply_rebind() {
    let Some(fiber) = crate::fiber::current() else {
        return;
    };
    let mut pending = PENDING_REBIND.lock();
    if let Some(pos) = pending.iter().position(|(f, _)| *f == fiber) {
        let (_, binding) = pending.swap_remove(pos);
        drop(pending);
        install(binding);
    }
}

/// Task bound to the calling thread.
pub(crate) fn bound_task() -> Option<BoundTask> {
    BINDING.with(|b| b.borrow().task.clone())
}

/// Actor and mailbox in effect on the calling thread (captured by new tasks).
pub(crate) fn ambient() -> (Option<ActorRef>, Option<MailboxRef>) {
    BINDING.with(|b| {
        let b = b.borrow();
        (b.actor.clone(), b.mailbox.clone())
    })
}

/// Actor bound to the calling thread, if any.
pub fn current_actor() -> Option<ActorRef> {
    BINDING.with(|b| b.borrow().actor.clone())
}

/// Mailbox bound to the calling thread, if any.
pub fn current_mailbox() -> Option<MailboxRef> {
    BINDING.with(|b| b.borrow().mailbox.clone())
}

/// Installs `actor` and `mailbox` on the calling thread until the guard drops.
///
/// The task slot is left untouched. Tasks created while the guard is alive
/// capture both values and re-install them on their own fiber.
///
/// # Example
/// ```
/// use taskfiber::context::{self, ActorRef, MailboxRef};
///
/// {
///     let _guard = context::enter(Some(ActorRef::new("greeter")), Some(MailboxRef::new(1u8)));
///     assert!(context::current_actor().is_some());
/// }
/// assert!(context::current_actor().is_none());
/// ```
#[must_use = "the context is restored when the guard is dropped"]
pub fn enter(actor: Option<ActorRef>, mailbox: Option<MailboxRef>) -> ContextGuard {
    let prev = BINDING.with(|b| {
        let mut b = b.borrow_mut();
        let prev = b.clone();
        b.actor = actor;
        b.mailbox = mailbox;
        prev
    });
    ContextGuard {
        prev: Some(prev),
        _not_send: PhantomData,
    }
}

/// Restores the previous actor/mailbox on drop. Bound to the thread that created it.
pub struct ContextGuard {
    prev: Option<Binding>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(prev) = self.prev.take() {
            BINDING.with(|b| {
                let mut b = b.borrow_mut();
                b.actor = prev.actor;
                b.mailbox = prev.mailbox;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_nests_and_restores() {
        assert!(current_actor().is_none());
        let outer = ActorRef::new(1u8);
        {
            let _g1 = enter(Some(outer.clone()), None);
            {
                let _g2 = enter(Some(ActorRef::new(2u8)), Some(MailboxRef::new(())));
                assert_eq!(current_actor().unwrap().downcast_ref::<u8>(), Some(&2));
                assert!(current_mailbox().is_some());
            }
            assert!(current_actor().unwrap().ptr_eq(&outer));
            assert!(current_mailbox().is_none());
        }
        assert!(current_actor().is_none());
    }

    #[test]
    fn ambient_is_per_thread() {
        let _g = enter(Some(ActorRef::new("main")), None);
        let seen = std::thread::spawn(|| current_actor().is_some())
            .join()
            .unwrap();
        assert!(!seen);
        assert!(ambient().0.is_some());
    }
}
