//! # Backing Store
//!
//! The ordered, index-addressable container a [`LazyVec`](super::LazyVec)
//! delegates to. The sequence handles all synchronization; stores are plain
//! single-threaded collections.

use std::collections::VecDeque;

/// Resizable, index-addressable storage for sequence elements.
pub trait BackingStore<T> {
    /// Creates an empty store with room for `capacity` elements.
    fn with_capacity(capacity: usize) -> Self
    where
        Self: Sized;

    /// Appends an element at the end.
    fn push(&mut self, value: T);

    /// Returns the element at `index`, if present.
    fn get(&self, index: usize) -> Option<&T>;

    /// Removes and returns the element at `index`, shifting later elements
    /// down by one. Returns `None` if `index` is out of bounds.
    fn remove(&mut self, index: usize) -> Option<T>;

    /// Number of stored elements.
    fn len(&self) -> usize;

    /// Returns whether the store holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> BackingStore<T> for Vec<T> {
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    #[inline]
    fn push(&mut self, value: T) {
        Vec::push(self, value);
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        (index < Vec::len(self)).then(|| Vec::remove(self, index))
    }

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T> BackingStore<T> for VecDeque<T> {
    fn with_capacity(capacity: usize) -> Self {
        VecDeque::with_capacity(capacity)
    }

    #[inline]
    fn push(&mut self, value: T) {
        self.push_back(value);
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        VecDeque::get(self, index)
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        VecDeque::remove(self, index)
    }

    #[inline]
    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}
