use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global fiber id allocator (0 is never handed out).
static NEXT_FIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Fiber`](super::Fiber).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(u64);

impl FiberId {
    pub(crate) fn next() -> Self {
        FiberId(NEXT_FIBER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fiber-{}", self.0)
    }
}
