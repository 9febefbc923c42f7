//! # Global task configuration.
//!
//! Provides [`Config`], the settings applied when a task's fiber is started
//! and when an event [`Bus`](crate::Bus) is created for it.
//!
//! ## Sentinel values
//! - `stack_size = 0` → platform default stack size for fiber threads
//! - `bus_capacity = 0` → clamped to 1

use std::borrow::Cow;

/// Configuration for task fibers and their event bus.
///
/// ## Field semantics
/// - `stack_size`: Stack size in bytes for each fiber thread (`0` = platform default)
/// - `thread_name`: Prefix for fiber thread names (`"{thread_name}-{fiber_id}"`)
/// - `bus_capacity`: Event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Stack size for fiber threads in bytes.
    ///
    /// Deeply recursive bodies need a larger stack; the body runs entirely on it.
    pub stack_size: usize,

    /// Prefix used to name fiber threads.
    pub thread_name: Cow<'static, str>,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the configured stack size as an `Option`.
    ///
    /// - `None` → platform default
    /// - `Some(n)` → `n` bytes
    #[inline]
    pub fn stack_size(&self) -> Option<usize> {
        if self.stack_size == 0 {
            None
        } else {
            Some(self.stack_size)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `stack_size = 0` (platform default)
    /// - `thread_name = "task"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            stack_size: 0,
            thread_name: Cow::Borrowed("task"),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stack_size_means_default() {
        let cfg = Config::default();
        assert_eq!(cfg.stack_size(), None);

        let cfg = Config {
            stack_size: 256 * 1024,
            ..Config::default()
        };
        assert_eq!(cfg.stack_size(), Some(256 * 1024));
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
