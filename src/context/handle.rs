use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque identity of the actor that owns the work being executed.
///
/// The task machinery never looks inside; the host runtime puts whatever it
/// uses as an actor handle in here and gets it back with [`downcast_ref`](ActorRef::downcast_ref).
#[derive(Clone)]
pub struct ActorRef(Arc<dyn Any + Send + Sync>);

impl ActorRef {
    /// Wraps a host actor value.
    pub fn new<T: Any + Send + Sync>(actor: T) -> Self {
        Self(Arc::new(actor))
    }

    /// Wraps an already shared host actor value.
    pub fn from_arc<T: Any + Send + Sync>(actor: Arc<T>) -> Self {
        Self(actor)
    }

    /// Borrows the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// True if both handles wrap the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorRef({:p})", Arc::as_ptr(&self.0))
    }
}

/// Opaque handle to the message-delivery channel of the owning actor.
///
/// Tasks communicate results through the mailbox, not through `resume`.
#[derive(Clone)]
pub struct MailboxRef(Arc<dyn Any + Send + Sync>);

impl MailboxRef {
    /// Wraps a host mailbox value.
    pub fn new<T: Any + Send + Sync>(mailbox: T) -> Self {
        Self(Arc::new(mailbox))
    }

    /// Wraps an already shared host mailbox value.
    pub fn from_arc<T: Any + Send + Sync>(mailbox: Arc<T>) -> Self {
        Self(mailbox)
    }

    /// Borrows the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// True if both handles wrap the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for MailboxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MailboxRef({:p})", Arc::as_ptr(&self.0))
    }
}
