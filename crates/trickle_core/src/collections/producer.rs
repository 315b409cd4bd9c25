//! # Producer Handle
//!
//! Owned write side of a [`LazyVec`]. Dropping the handle signals
//! completion, so consumers are released even if production fails or panics.

use super::lazy_vec::LazyVec;
use super::store::BackingStore;
use crate::error::SequenceResult;
use std::sync::Arc;

/// Write handle for the producer thread.
///
/// ## Usage
///
/// ```rust
/// use std::sync::Arc;
/// use trickle_core::LazyVec;
///
/// let seq: Arc<LazyVec<u32>> = Arc::new(LazyVec::new());
/// {
///     let producer = seq.producer();
///     producer.push(1).unwrap();
///     producer.push(2).unwrap();
///     // Handle is dropped here, which calls `done()`
/// }
/// assert_eq!(seq.size(), 2);
/// ```
pub struct Producer<T, S: BackingStore<T> = Vec<T>> {
    seq: Arc<LazyVec<T, S>>,
}

impl<T, S: BackingStore<T>> Producer<T, S> {
    pub(crate) fn new(seq: Arc<LazyVec<T, S>>) -> Self {
        Self { seq }
    }

    /// Appends one element.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Closed`](crate::SequenceError::Closed) if the
    /// sequence was closed through another path.
    pub fn push(&self, element: T) -> SequenceResult<()> {
        self.seq.try_append(element)
    }

    /// Appends a batch, published with one gate release.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Closed`](crate::SequenceError::Closed) if the
    /// sequence was closed through another path.
    pub fn extend<I>(&self, elements: I) -> SequenceResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        self.seq.append_all(elements)
    }

    /// The sequence this handle writes to.
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> &Arc<LazyVec<T, S>> {
        &self.seq
    }

    /// Signals completion now instead of at drop.
    pub fn finish(self) {
        self.seq.done();
    }
}

impl<T, S: BackingStore<T>> Drop for Producer<T, S> {
    fn drop(&mut self) {
        if self.seq.is_done() {
            return;
        }
        if std::thread::panicking() {
            tracing::warn!(
                label = %self.seq.config().label,
                len = self.seq.available(),
                "producer panicked, closing sequence early"
            );
        }
        self.seq.done();
    }
}
