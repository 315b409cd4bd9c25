//! # Derived Sequence Operations
//!
//! Generic algorithms written only against indexed reads. Walking indices
//! until `OutOfRange` means a lazy sequence streams its elements into these
//! algorithms as they arrive instead of waiting for the final size.

use super::lazy_vec::LazyVec;
use super::store::BackingStore;
use crate::error::{SequenceError, SequenceResult};

/// Read-only view built on indexed access.
pub trait SequenceView<T> {
    /// Returns the element at `index`, blocking if the implementation does.
    ///
    /// # Errors
    ///
    /// Returns an error once `index` is past the end.
    fn get_at(&self, index: usize) -> SequenceResult<T>;

    /// Final number of elements, blocking if the implementation does.
    fn total_len(&self) -> usize;

    /// Index of the first element equal to `needle`.
    fn position_of(&self, needle: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        (0..)
            .map_while(|i| self.get_at(i).ok().map(|value| (i, value)))
            .find(|(_, value)| value == needle)
            .map(|(i, _)| i)
    }

    /// Returns whether any element equals `needle`.
    ///
    /// Returns as soon as a match is produced.
    fn contains(&self, needle: &T) -> bool
    where
        T: PartialEq,
    {
        self.position_of(needle).is_some()
    }

    /// The first element, if the sequence is not empty.
    fn head(&self) -> Option<T> {
        self.get_at(0).ok()
    }

    /// Copies every element into a `Vec`.
    fn collect_all(&self) -> Vec<T> {
        (0..).map_while(|i| self.get_at(i).ok()).collect()
    }
}

impl<T: Clone, S: BackingStore<T>> SequenceView<T> for LazyVec<T, S> {
    fn get_at(&self, index: usize) -> SequenceResult<T> {
        self.get(index)
    }

    fn total_len(&self) -> usize {
        self.size()
    }
}

impl<T: Clone> SequenceView<T> for Vec<T> {
    fn get_at(&self, index: usize) -> SequenceResult<T> {
        self.as_slice()
            .get(index)
            .cloned()
            .ok_or(SequenceError::OutOfRange { index, len: self.len() })
    }

    fn total_len(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_derived_operations() {
        let seq: LazyVec<&str> = LazyVec::new();
        seq.append_all(["red", "green", "blue"]).unwrap();
        seq.done();

        assert_eq!(seq.total_len(), 3);
        assert_eq!(seq.head(), Some("red"));
        assert_eq!(seq.position_of(&"blue"), Some(2));
        assert!(seq.contains(&"green"));
        assert!(!seq.contains(&"black"));
        assert_eq!(seq.collect_all(), vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_empty_view() {
        let seq: LazyVec<u8> = LazyVec::new();
        seq.done();
        assert_eq!(seq.head(), None);
        assert!(seq.collect_all().is_empty());
    }

    #[test]
    fn test_plain_vec_view() {
        let items = vec![4u8, 5, 6];
        assert_eq!(items.get_at(1), Ok(5));
        assert_eq!(
            items.get_at(3),
            Err(SequenceError::OutOfRange { index: 3, len: 3 })
        );
        assert_eq!(SequenceView::total_len(&items), 3);
        assert_eq!(items.position_of(&6), Some(2));
        assert_eq!(items.head(), Some(4));
        assert_eq!(items.collect_all(), items);
    }

    #[test]
    fn test_contains_returns_before_done() {
        let seq: Arc<LazyVec<u32>> = Arc::new(LazyVec::new());

        let searcher = {
            let seq = Arc::clone(&seq);
            thread::spawn(move || seq.contains(&3))
        };

        seq.append_all([1, 2, 3]).unwrap();
        // Found without waiting for completion.
        assert!(searcher.join().unwrap());
        assert!(!seq.is_done());
        seq.done();
    }
}
