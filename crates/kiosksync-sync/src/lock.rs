//! Single-flight lock
//!
//! A binary, non-blocking, non-reentrant gate. Exactly one concurrent
//! caller of [`SingleFlight::try_acquire`] observes success; everyone
//! else fails immediately. There is no queue: a caller that loses the
//! race must report "already in progress" to its client rather than
//! wait.
//!
//! The same gate serializes updates and manifest walks, because a walk
//! reads the same tree an update mutates; a concurrent read during a
//! merge could yield a partial manifest.
//!
//! Release happens in [`FlightGuard`]'s `Drop`, so a panicking or
//! early-returning holder can never leave the gate permanently closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

/// The shared gate. Cheap to clone via `Arc`.
#[derive(Debug, Default)]
pub struct SingleFlight {
    held: AtomicBool,
}

impl SingleFlight {
    /// Create a new, free gate.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            held: AtomicBool::new(false),
        })
    }

    /// Attempt to acquire the gate without blocking.
    ///
    /// Returns `None` if it is already held. The returned guard releases
    /// the gate when dropped.
    #[must_use]
    pub fn try_acquire(self: &Arc<Self>) -> Option<FlightGuard> {
        if self
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            debug!("single-flight lock acquired");
            Some(FlightGuard {
                lock: Arc::clone(self),
            })
        } else {
            debug!("single-flight lock contended");
            None
        }
    }

    /// Whether the gate is currently held. Test/introspection only; the
    /// answer is stale the moment it is returned.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

/// RAII guard for the single-flight gate.
#[derive(Debug)]
pub struct FlightGuard {
    lock: Arc<SingleFlight>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
        debug!("single-flight lock released");
    }
}
