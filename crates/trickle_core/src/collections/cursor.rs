//! # Blocking Cursor
//!
//! Position-by-position walk over a [`LazyVec`] that waits for elements the
//! producer has not appended yet.
//!
//! ```text
//!   Iterating ──(done, no element left)──► Exhausted
//!       │
//!       └──(foreign removal detected)────► Invalidated
//! ```
//!
//! Appends are expected growth and never invalidate a cursor. Removals made
//! by anyone other than the cursor itself do.

use super::lazy_vec::LazyVec;
use super::store::BackingStore;
use crate::error::{SequenceError, SequenceResult};
use std::fmt;
use std::iter::FusedIterator;

/// Lifecycle of a [`Cursor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// More elements may follow.
    Iterating,
    /// Production finished and every element was returned.
    Exhausted,
    /// A concurrent modification was detected.
    Invalidated,
}

/// Fail-fast blocking cursor over a [`LazyVec`].
///
/// Also an [`Iterator`] over `SequenceResult<T>`: it yields `Ok` elements,
/// at most one `Err` on a concurrent modification, then stops.
///
/// ## Usage
///
/// ```rust
/// use trickle_core::LazyVec;
///
/// let seq: LazyVec<u32> = LazyVec::new();
/// seq.append_all([1, 2, 3, 4]).unwrap();
/// seq.done();
///
/// let mut cursor = seq.cursor();
/// while cursor.has_next() {
///     if cursor.try_next().unwrap() % 2 == 0 {
///         cursor.remove().unwrap();
///     }
/// }
/// assert_eq!(seq.size(), 2);
/// ```
pub struct Cursor<'a, T, S = Vec<T>> {
    /// The sequence being walked.
    seq: &'a LazyVec<T, S>,
    /// Index of the next element to return.
    position: usize,
    /// Index of the element most recently returned, cleared by `remove`.
    last_returned: Option<usize>,
    /// Removal count this cursor believes the sequence has.
    expected_removals: usize,
    /// Lifecycle state.
    state: CursorState,
}

impl<'a, T, S: BackingStore<T>> Cursor<'a, T, S> {
    pub(crate) fn new(seq: &'a LazyVec<T, S>) -> Self {
        Self {
            seq,
            position: 0,
            last_returned: None,
            expected_removals: seq.removals(),
            state: CursorState::Iterating,
        }
    }

    /// Index of the next element to return.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Returns whether another element exists, waiting for the producer if
    /// necessary.
    ///
    /// Returns `false` only once production has finished with no element at
    /// the current position, or if the cursor is already terminal.
    ///
    /// After a foreign removal this returns `true` without blocking, so the
    /// following [`Cursor::try_next`] reports the concurrent modification
    /// instead of the removal passing for the end of the sequence.
    pub fn has_next(&mut self) -> bool {
        if self.state != CursorState::Iterating {
            return false;
        }
        let seq = self.seq;
        if seq.removals() != self.expected_removals {
            return true;
        }
        if seq.wait_for(self.position, None).is_ok()
            || seq.removals() != self.expected_removals
        {
            return true;
        }
        self.state = CursorState::Exhausted;
        false
    }

    /// Returns the element at the current position and advances.
    ///
    /// Blocks like [`Cursor::has_next`] if the element is not produced yet.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::ConcurrentModification`] if another cursor removed
    ///   an element since this cursor last synchronized.
    /// - [`SequenceError::NoSuchElement`] if production finished before the
    ///   current position.
    pub fn try_next(&mut self) -> SequenceResult<T>
    where
        T: Clone,
    {
        self.check_for_comodification()?;

        let seq = self.seq;
        let index = self.position;
        let value = match seq.wait_for(index, None) {
            Ok(store) => {
                // Removals take the write lock, so this check is stable for
                // as long as `store` is held.
                self.check_for_comodification()?;
                store.get(index).cloned()
            }
            Err(SequenceError::OutOfRange { .. }) => None,
            Err(other) => return Err(other),
        };

        if let Some(value) = value {
            self.last_returned = Some(index);
            self.position = index + 1;
            Ok(value)
        } else {
            self.check_for_comodification()?;
            self.state = CursorState::Exhausted;
            Err(SequenceError::NoSuchElement)
        }
    }

    /// Removes and returns the element most recently returned by
    /// [`Cursor::try_next`].
    ///
    /// # Errors
    ///
    /// - [`SequenceError::IllegalState`] without a preceding `try_next`, or
    ///   when called twice in a row.
    /// - [`SequenceError::ConcurrentModification`] if the sequence was
    ///   modified by someone else, including when the element is gone.
    pub fn remove(&mut self) -> SequenceResult<T> {
        let Some(last) = self.last_returned else {
            return Err(SequenceError::IllegalState("remove() requires a preceding next()"));
        };
        self.check_for_comodification()?;

        match self.seq.remove_checked(last, self.expected_removals) {
            Ok((value, removals)) => {
                if last < self.position {
                    self.position -= 1;
                }
                self.last_returned = None;
                self.expected_removals = removals;
                Ok(value)
            }
            Err(err) => {
                self.state = CursorState::Invalidated;
                Err(err)
            }
        }
    }

    fn check_for_comodification(&mut self) -> SequenceResult<()> {
        let actual = self.seq.removals();
        if actual == self.expected_removals {
            return Ok(());
        }
        if self.state != CursorState::Invalidated {
            tracing::debug!(
                label = %self.seq.config().label,
                expected = self.expected_removals,
                actual,
                position = self.position,
                "cursor invalidated by concurrent modification"
            );
        }
        self.state = CursorState::Invalidated;
        Err(SequenceError::ConcurrentModification {
            expected: self.expected_removals,
            actual,
        })
    }
}

impl<T, S: BackingStore<T>> fmt::Debug for Cursor<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("label", &self.seq.config().label)
            .field("position", &self.position)
            .field("last_returned", &self.last_returned)
            .field("expected_removals", &self.expected_removals)
            .field("state", &self.state)
            .finish()
    }
}

impl<T: Clone, S: BackingStore<T>> Iterator for Cursor<'_, T, S> {
    type Item = SequenceResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        match self.try_next() {
            Ok(value) => Some(Ok(value)),
            Err(SequenceError::NoSuchElement) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T: Clone, S: BackingStore<T>> FusedIterator for Cursor<'_, T, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn closed_seq(items: &[u32]) -> LazyVec<u32> {
        let seq = LazyVec::new();
        seq.append_all(items.iter().copied()).unwrap();
        seq.done();
        seq
    }

    #[test]
    fn test_cursor_walks_in_order() {
        let seq = closed_seq(&[1, 2, 3]);
        let mut cursor = seq.cursor();

        let mut seen = Vec::new();
        while cursor.has_next() {
            seen.push(cursor.try_next().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_next_past_end() {
        let seq = closed_seq(&[1]);
        let mut cursor = seq.cursor();
        assert_eq!(cursor.try_next().unwrap(), 1);
        assert_eq!(cursor.try_next(), Err(SequenceError::NoSuchElement));
        assert_eq!(cursor.state(), CursorState::Exhausted);
    }

    #[test]
    fn test_empty_closed_sequence() {
        let seq = closed_seq(&[]);
        let mut cursor = seq.cursor();
        assert!(!cursor.has_next());
        assert_eq!(seq.iter().count(), 0);
    }

    #[test]
    fn test_remove_requires_next() {
        let seq = closed_seq(&[1, 2]);
        let mut cursor = seq.cursor();
        assert!(matches!(cursor.remove(), Err(SequenceError::IllegalState(_))));

        cursor.try_next().unwrap();
        assert_eq!(cursor.remove().unwrap(), 1);
        assert!(matches!(cursor.remove(), Err(SequenceError::IllegalState(_))));
        assert_eq!(cursor.state(), CursorState::Iterating);
    }

    #[test]
    fn test_remove_adjusts_position() {
        let seq = closed_seq(&[1, 2, 3, 4, 5]);
        let mut cursor = seq.cursor();

        let mut kept = Vec::new();
        while cursor.has_next() {
            let value = cursor.try_next().unwrap();
            if value % 2 == 0 {
                cursor.remove().unwrap();
            } else {
                kept.push(value);
            }
        }

        assert_eq!(kept, vec![1, 3, 5]);
        assert_eq!(seq.size(), 3);
        assert_eq!(seq.get(1).unwrap(), 3);
        assert_eq!(seq.mod_count(), 5 + 2);
    }

    #[test]
    fn test_foreign_removal_invalidates() {
        let seq = closed_seq(&[1, 2, 3]);
        let mut a = seq.cursor();
        let mut b = seq.cursor();

        assert_eq!(b.try_next().unwrap(), 1);
        assert_eq!(a.try_next().unwrap(), 1);
        a.remove().unwrap();

        assert_eq!(
            b.try_next(),
            Err(SequenceError::ConcurrentModification { expected: 0, actual: 1 })
        );
        assert_eq!(b.state(), CursorState::Invalidated);
        assert!(!b.has_next());
        assert!(matches!(b.remove(), Err(SequenceError::ConcurrentModification { .. })));
        // Still failing: the cursor never silently recovers.
        assert!(b.try_next().is_err());
    }

    #[test]
    fn test_removal_of_stale_element_invalidates() {
        let seq = closed_seq(&[1, 2]);
        let mut a = seq.cursor();
        let mut b = seq.cursor();

        a.try_next().unwrap();
        b.try_next().unwrap();
        b.remove().unwrap();

        assert!(matches!(a.remove(), Err(SequenceError::ConcurrentModification { .. })));
        assert_eq!(a.state(), CursorState::Invalidated);
        assert_eq!(seq.size(), 1);
    }

    #[test]
    fn test_foreign_removal_at_tail_is_reported() {
        let seq = closed_seq(&[1, 2, 3]);
        let mut iter = seq.iter();
        assert_eq!(iter.next(), Some(Ok(1)));
        assert_eq!(iter.next(), Some(Ok(2)));

        // Leaves `position == len`, which must not read as exhaustion.
        let mut other = seq.cursor();
        other.try_next().unwrap();
        other.remove().unwrap();

        assert_eq!(
            iter.next(),
            Some(Err(SequenceError::ConcurrentModification { expected: 0, actual: 1 }))
        );
        assert_eq!(iter.state(), CursorState::Invalidated);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_has_next_reports_foreign_removal() {
        let seq = closed_seq(&[1, 2]);
        let mut a = seq.cursor();
        a.try_next().unwrap();
        a.try_next().unwrap();

        let mut b = seq.cursor();
        b.try_next().unwrap();
        b.remove().unwrap();

        assert!(a.has_next());
        assert!(matches!(a.try_next(), Err(SequenceError::ConcurrentModification { .. })));
        assert!(!a.has_next());
    }

    #[test]
    fn test_appends_do_not_invalidate() {
        let seq: LazyVec<u32> = LazyVec::new();
        seq.append(1);

        let mut cursor = seq.cursor();
        assert_eq!(cursor.try_next().unwrap(), 1);
        seq.append(2);
        assert_eq!(cursor.try_next().unwrap(), 2);
        cursor.remove().unwrap();
        seq.append(3);
        assert_eq!(cursor.try_next().unwrap(), 3);
    }

    #[test]
    fn test_iterator_yields_then_fuses_on_error() {
        let seq = closed_seq(&[1, 2, 3]);
        let mut iter = seq.iter();
        assert_eq!(iter.next(), Some(Ok(1)));

        let mut other = seq.cursor();
        other.try_next().unwrap();
        other.remove().unwrap();

        assert!(matches!(iter.next(), Some(Err(SequenceError::ConcurrentModification { .. }))));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_has_next_blocks_until_done() {
        let seq: Arc<LazyVec<u32>> = Arc::new(LazyVec::new());
        seq.append(1);

        let consumer = {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                let mut cursor = seq.cursor();
                let first = cursor.try_next().unwrap();
                (first, cursor.has_next())
            })
        };

        thread::sleep(Duration::from_millis(30));
        seq.done();
        assert_eq!(consumer.join().unwrap(), (1, false));
    }
}
