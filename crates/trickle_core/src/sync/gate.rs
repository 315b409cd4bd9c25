//! # Permit Gate
//!
//! Shared-mode counting synchronizer behind every blocking read.
//!
//! ## Architecture
//!
//! ```text
//!   permits:  0 ──► 1 ──► 2 ──► ... ──► n ─────────────► CLOSED (usize::MAX)
//!                ▲     ▲     ▲                              ▲
//!           release(1) per append                        close()
//!
//!   acquire(k): park until permits >= k
//! ```
//!
//! ## Thread Safety
//!
//! - The counter is a single atomic and never decreases.
//! - Waiters re-check their own threshold under the mutex, so a release that
//!   lands between a waiter's check and its park is never lost.
//! - `CLOSED` is terminal: further releases are no-ops and never wrap.

use crate::error::{SequenceError, SequenceResult};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Monotonic counting gate with a terminal closed state.
///
/// `acquire` consumes nothing: permits are a high-water mark, not tokens.
///
/// ## Usage
///
/// ```rust
/// use trickle_core::Gate;
///
/// let gate = Gate::new();
/// gate.release(2);
/// gate.acquire(2); // returns immediately
/// assert!(!gate.try_acquire(3));
///
/// gate.close();
/// gate.acquire(1_000_000); // closed gates satisfy everything
/// ```
pub struct Gate {
    /// High-water mark of published permits.
    permits: AtomicUsize,
    /// Guards the park/wake handshake; holds no data.
    mutex: Mutex<()>,
    /// Parked acquirers.
    condvar: Condvar,
}

impl Gate {
    /// Permit count of a closed gate.
    pub const CLOSED: usize = usize::MAX;

    /// Creates an open gate with zero permits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            permits: AtomicUsize::new(0),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    /// Returns the current permit count.
    #[inline]
    #[must_use]
    pub fn permits(&self) -> usize {
        self.permits.load(Ordering::Acquire)
    }

    /// Returns whether the gate reached its terminal state.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits() == Self::CLOSED
    }

    /// Returns whether `acquire(threshold)` would return without blocking.
    #[inline]
    #[must_use]
    pub fn try_acquire(&self, threshold: usize) -> bool {
        self.permits() >= threshold
    }

    /// Blocks until at least `threshold` permits have been published.
    ///
    /// `threshold == 0` never blocks; `threshold == Gate::CLOSED` returns
    /// only once the gate is closed.
    pub fn acquire(&self, threshold: usize) {
        if self.try_acquire(threshold) {
            return;
        }

        let mut guard = self.mutex.lock();
        while !self.try_acquire(threshold) {
            tracing::trace!(threshold, permits = self.permits(), "gate wait");
            self.condvar.wait(&mut guard);
        }
        tracing::trace!(threshold, "gate pass");
    }

    /// Like [`Gate::acquire`], but gives up at `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Timeout`] if the threshold was not reached in
    /// time. The gate is left untouched.
    pub fn acquire_until(&self, threshold: usize, deadline: Instant) -> SequenceResult<()> {
        if self.try_acquire(threshold) {
            return Ok(());
        }

        let start = Instant::now();
        let mut guard = self.mutex.lock();
        while !self.try_acquire(threshold) {
            if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                if self.try_acquire(threshold) {
                    break;
                }
                let waited_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(threshold, waited_ms, "gate wait timed out");
                return Err(SequenceError::Timeout { threshold, waited_ms });
            }
        }
        Ok(())
    }

    /// Like [`Gate::acquire`], but waits at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Timeout`] if the threshold was not reached in
    /// time.
    pub fn acquire_timeout(&self, threshold: usize, timeout: Duration) -> SequenceResult<()> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.acquire_until(threshold, deadline),
            // Unrepresentable deadline: effectively unbounded.
            None => {
                self.acquire(threshold);
                Ok(())
            }
        }
    }

    /// Publishes `delta` more permits, saturating at [`Gate::CLOSED`].
    ///
    /// Returns `false` if nothing changed (`delta == 0` or already closed).
    pub fn release(&self, delta: usize) -> bool {
        if delta == 0 {
            return false;
        }

        // CAS loop: concurrent releases never lose increments.
        let updated = self
            .permits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if current == Self::CLOSED {
                    None
                } else {
                    Some(current.saturating_add(delta))
                }
            });

        if updated.is_err() {
            return false;
        }
        self.wake_all();
        true
    }

    /// Moves the gate to its terminal state and wakes every waiter.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn close(&self) -> bool {
        let previous = self.permits.swap(Self::CLOSED, Ordering::AcqRel);
        if previous == Self::CLOSED {
            return false;
        }
        self.wake_all();
        true
    }

    fn wake_all(&self) {
        // A waiter holds the mutex from its threshold check until it parks.
        drop(self.mutex.lock());
        self.condvar.notify_all();
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let permits = self.permits();
        f.debug_struct("Gate")
            .field("permits", &permits)
            .field("closed", &(permits == Self::CLOSED))
            .finish()
    }
}
