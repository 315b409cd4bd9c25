//! # Lazy Vector
//!
//! Append-only sequence whose reads block until the element is produced.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌───────────────────────────────────┐
//!                  │              LazyVec              │
//!                  │                                   │
//!   append() ─────►│  RwLock<S> ──push──► [0][1][2]    │
//!                  │      │                            │
//!                  │      └──► Gate.release(1)         │
//!                  │                                   │
//!   done() ───────►│  Gate.close()                     │
//!                  └───────────────────────────────────┘
//!                        ▲              ▲           ▲
//!                   get(i): acquire  size():     Cursor:
//!                   (i + 1 + removed) acquire    has_next / next
//!                                    (CLOSED)
//! ```
//!
//! ## Ordering
//!
//! The store write happens under the write lock, which is released before
//! the gate publishes the permit. A reader that passes the gate and then
//! takes the read lock always sees the element.
//!
//! ## Removal
//!
//! Cursors may remove elements. Removal shifts later elements down, so the
//! element at store index `i` is the `(i + 1 + removed)`-th one produced.
//! Reads use that threshold, which keeps removals from ending another
//! consumer's iteration before the producer is done.

use super::cursor::Cursor;
use super::producer::Producer;
use super::store::BackingStore;
use crate::config::LazyVecConfig;
use crate::error::{SequenceError, SequenceResult};
use crate::sync::Gate;
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A growable sequence shared between one producer and many consumers.
///
/// Reads block until the requested element exists or the producer calls
/// [`LazyVec::done`]. Share it with `Arc`.
///
/// ## Usage
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use trickle_core::LazyVec;
///
/// let seq: Arc<LazyVec<String>> = Arc::new(LazyVec::new());
///
/// let producer = Arc::clone(&seq);
/// let handle = thread::spawn(move || {
///     for word in ["A", "B", "C"] {
///         producer.append(word.to_string());
///     }
///     producer.done();
/// });
///
/// // Blocks until the producer is finished.
/// assert_eq!(seq.size(), 3);
/// assert_eq!(seq.get(1).unwrap(), "B");
/// handle.join().unwrap();
/// ```
pub struct LazyVec<T, S = Vec<T>> {
    /// Backing store.
    store: RwLock<S>,
    /// Publishes "number of elements produced".
    gate: Gate,
    /// Bumped on every append and removal.
    mod_count: AtomicUsize,
    /// Elements removed through cursors.
    removed: AtomicUsize,
    /// Elements appended so far, for progress events.
    appended: AtomicUsize,
    /// Configuration.
    config: LazyVecConfig,
    /// Marker for T.
    _phantom: PhantomData<T>,
}

impl<T, S: BackingStore<T>> LazyVec<T, S> {
    /// Creates an empty, open sequence with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LazyVecConfig::default())
    }

    /// Creates an empty, open sequence with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(LazyVecConfig::default().with_initial_capacity(capacity))
    }

    /// Creates an empty, open sequence from a config.
    #[must_use]
    pub fn with_config(config: LazyVecConfig) -> Self {
        tracing::debug!(
            label = %config.label,
            capacity = config.initial_capacity,
            "lazy sequence created"
        );
        Self {
            store: RwLock::new(S::with_capacity(config.initial_capacity)),
            gate: Gate::new(),
            mod_count: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            appended: AtomicUsize::new(0),
            config,
            _phantom: PhantomData,
        }
    }

    /// Returns the config this sequence was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LazyVecConfig {
        &self.config
    }

    // =========================================================================
    // Producer side
    // =========================================================================

    /// Appends an element and wakes readers waiting for it.
    ///
    /// Returns `true` if the element was stored. After [`LazyVec::done`] the
    /// element is dropped, a warning is logged and `false` is returned.
    pub fn append(&self, element: T) -> bool {
        match self.try_append(element) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(label = %self.config.label, "append after done() ignored");
                false
            }
        }
    }

    /// Appends an element, failing if production already finished.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Closed`] after [`LazyVec::done`].
    pub fn try_append(&self, element: T) -> SequenceResult<()> {
        {
            let mut store = self.store.write();
            if self.gate.is_closed() {
                return Err(SequenceError::Closed);
            }
            store.push(element);
            self.mod_count.fetch_add(1, Ordering::AcqRel);
        }
        self.gate.release(1);
        self.note_appended(1);
        Ok(())
    }

    /// Appends a batch under one lock and publishes it with one release.
    ///
    /// Returns the number of elements appended.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Closed`] after [`LazyVec::done`]; nothing is
    /// appended in that case.
    pub fn append_all<I>(&self, elements: I) -> SequenceResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let count = {
            let mut store = self.store.write();
            if self.gate.is_closed() {
                return Err(SequenceError::Closed);
            }
            let before = store.len();
            for element in elements {
                store.push(element);
            }
            let count = store.len() - before;
            self.mod_count.fetch_add(count, Ordering::AcqRel);
            count
        };
        self.gate.release(count);
        self.note_appended(count);
        Ok(count)
    }

    /// Signals that production finished. Idempotent.
    ///
    /// Every blocked and future read resolves against the final length.
    pub fn done(&self) {
        // Closing under the write lock orders it against in-flight appends.
        let closed = {
            let _store = self.store.write();
            self.gate.close()
        };
        if closed {
            tracing::info!(
                label = %self.config.label,
                len = self.available(),
                "production finished"
            );
        }
    }

    /// Returns a producer handle that calls [`LazyVec::done`] when dropped.
    #[must_use]
    pub fn producer(self: &Arc<Self>) -> Producer<T, S> {
        Producer::new(Arc::clone(self))
    }

    /// Creates a sequence and fills it from `produce` on a background thread.
    ///
    /// The sequence is closed when `produce` returns or panics.
    ///
    /// ```rust
    /// use trickle_core::{LazyVec, LazyVecConfig};
    ///
    /// let (seq, handle) = LazyVec::<u32>::spawn_producer(LazyVecConfig::default(), |producer| {
    ///     for i in 0..5 {
    ///         producer.push(i)?;
    ///     }
    ///     Ok::<_, trickle_core::SequenceError>(())
    /// });
    ///
    /// let items: Vec<u32> = seq.iter().collect::<Result<_, _>>().unwrap();
    /// assert_eq!(items, vec![0, 1, 2, 3, 4]);
    /// handle.join().unwrap().unwrap();
    /// ```
    pub fn spawn_producer<F, R>(config: LazyVecConfig, produce: F) -> (Arc<Self>, JoinHandle<R>)
    where
        F: FnOnce(Producer<T, S>) -> R + Send + 'static,
        R: Send + 'static,
        T: Send + Sync + 'static,
        S: Send + Sync + 'static,
    {
        let seq = Arc::new(Self::with_config(config));
        let producer = seq.producer();
        let handle = thread::spawn(move || produce(producer));
        (seq, handle)
    }

    fn note_appended(&self, count: usize) {
        let interval = self.config.progress_interval;
        let total = self.appended.fetch_add(count, Ordering::Relaxed) + count;
        if interval > 0 && total / interval > (total - count) / interval {
            tracing::debug!(label = %self.config.label, appended = total, "append progress");
        }
    }

    // =========================================================================
    // Consumer side
    // =========================================================================

    /// Returns a clone of the element at `index`, waiting until it exists.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::OutOfRange`] if production finished without
    /// reaching `index`.
    pub fn get(&self, index: usize) -> SequenceResult<T>
    where
        T: Clone,
    {
        self.with(index, T::clone)
    }

    /// Like [`LazyVec::get`], but waits at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Timeout`] if the element did not arrive in
    /// time, or [`SequenceError::OutOfRange`] as for [`LazyVec::get`].
    pub fn get_timeout(&self, index: usize, timeout: Duration) -> SequenceResult<T>
    where
        T: Clone,
    {
        let deadline = Instant::now().checked_add(timeout);
        let store = self.wait_for(index, deadline)?;
        store
            .get(index)
            .cloned()
            .ok_or(SequenceError::OutOfRange { index, len: store.len() })
    }

    /// Runs `f` on the element at `index`, waiting until it exists.
    ///
    /// The read lock is held while `f` runs: appending from inside `f` on the
    /// same thread deadlocks.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::OutOfRange`] if production finished without
    /// reaching `index`.
    pub fn with<R>(&self, index: usize, f: impl FnOnce(&T) -> R) -> SequenceResult<R> {
        let store = self.wait_for(index, None)?;
        store
            .get(index)
            .map(f)
            .ok_or(SequenceError::OutOfRange { index, len: store.len() })
    }

    /// Waits for production to finish and returns the final length.
    ///
    /// This is not a live count; see [`LazyVec::available`].
    #[must_use]
    pub fn size(&self) -> usize {
        self.gate.acquire(Gate::CLOSED);
        self.store.read().len()
    }

    /// Like [`LazyVec::size`], but waits at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Timeout`] if production did not finish in time.
    pub fn size_timeout(&self, timeout: Duration) -> SequenceResult<usize> {
        self.gate.acquire_timeout(Gate::CLOSED, timeout)?;
        Ok(self.store.read().len())
    }

    /// Number of elements readable right now, without blocking.
    #[must_use]
    pub fn available(&self) -> usize {
        self.store.read().len()
    }

    /// Returns whether the producer signalled completion.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.gate.is_closed()
    }

    /// Number of structural modifications (appends and removals) so far.
    #[inline]
    #[must_use]
    pub fn mod_count(&self) -> usize {
        self.mod_count.load(Ordering::Acquire)
    }

    /// Returns a blocking cursor positioned before the first element.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'_, T, S> {
        Cursor::new(self)
    }

    /// Alias for [`LazyVec::cursor`], for `for item in seq.iter()` loops.
    #[must_use]
    pub fn iter(&self) -> Cursor<'_, T, S> {
        self.cursor()
    }

    // =========================================================================
    // Cursor support
    // =========================================================================

    /// Number of index-shifting modifications so far.
    #[inline]
    pub(crate) fn removals(&self) -> usize {
        self.removed.load(Ordering::Acquire)
    }

    /// Waits until store index `index` exists and returns the read guard.
    ///
    /// Fails with `OutOfRange` only once production has finished.
    pub(crate) fn wait_for(
        &self,
        index: usize,
        deadline: Option<Instant>,
    ) -> SequenceResult<RwLockReadGuard<'_, S>> {
        let mut removed = self.removals();
        loop {
            let threshold = index.saturating_add(1).saturating_add(removed);
            match deadline {
                Some(deadline) => self.gate.acquire_until(threshold, deadline)?,
                None => self.gate.acquire(threshold),
            }

            let store = self.store.read();
            let len = store.len();
            if index < len {
                return Ok(store);
            }
            if self.gate.is_closed() {
                return Err(SequenceError::OutOfRange { index, len });
            }
            // A removal landed after we sampled the count; wait for one more.
            removed = self.removals();
        }
    }

    /// Removes the element at `index` if no removal happened since the
    /// caller observed `expected` removals.
    ///
    /// Returns the element and the new removal count.
    pub(crate) fn remove_checked(&self, index: usize, expected: usize) -> SequenceResult<(T, usize)> {
        let mut store = self.store.write();
        let actual = self.removals();
        if actual != expected {
            return Err(SequenceError::ConcurrentModification { expected, actual });
        }
        let value = store
            .remove(index)
            .ok_or(SequenceError::ConcurrentModification { expected, actual })?;
        self.mod_count.fetch_add(1, Ordering::AcqRel);
        let removed = self.removed.fetch_add(1, Ordering::AcqRel) + 1;
        Ok((value, removed))
    }
}

impl<T, S: BackingStore<T>> Default for LazyVec<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Clone, S: BackingStore<T>> IntoIterator for &'a LazyVec<T, S> {
    type Item = SequenceResult<T>;
    type IntoIter = Cursor<'a, T, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.cursor()
    }
}

impl<T, S: BackingStore<T>> fmt::Debug for LazyVec<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyVec")
            .field("label", &self.config.label)
            .field("available", &self.available())
            .field("done", &self.is_done())
            .field("mod_count", &self.mod_count())
            .finish()
    }
}
