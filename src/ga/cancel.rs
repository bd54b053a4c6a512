//! Cooperative cancellation.
//!
//! The optimizer polls for cancellation once per generation, at the top of
//! the loop. Two sources can stop it: a [`CancelToken`] raised by any
//! thread, and a [`Deadline`] derived from the configured time budget and
//! compared against the monotonic clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// A write-once cancellation signal shared between threads.
///
/// Clones share the same flag. Once raised it stays raised.
///
/// ```
/// use u_testsched::ga::CancelToken;
///
/// let token = CancelToken::new();
/// let remote = token.clone();
/// remote.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an unraised token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the signal has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Spawns a timer thread that raises the signal after `delay`.
    pub fn cancel_after(&self, delay: Duration) -> JoinHandle<()> {
        let token = self.clone();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            token.cancel();
        })
    }
}

/// Point in monotonic time after which the run stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never passes.
    pub fn none() -> Self {
        Self(None)
    }

    /// Deadline `ms` milliseconds from now; 0 means no deadline.
    pub fn after_ms(ms: u64) -> Self {
        Self((ms > 0).then(|| Instant::now() + Duration::from_millis(ms)))
    }

    /// Deadline at a fixed instant.
    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Whether the deadline has been reached.
    pub fn has_passed(&self) -> bool {
        self.0.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
