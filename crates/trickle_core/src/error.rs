//! # Sequence Error Types
//!
//! All errors that can occur while reading, iterating or configuring a
//! lazy sequence. The gate itself never fails.

use thiserror::Error;

/// Errors that can occur in sequence operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// Production finished and the requested index was never produced.
    #[error("index {index} out of range for sequence of final length {len}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the sequence when the read resolved.
        len: usize,
    },

    /// A cursor was advanced past the last element.
    #[error("no more elements")]
    NoSuchElement,

    /// The sequence was structurally changed behind a cursor's back.
    #[error("concurrent modification: cursor expected {expected} removals, sequence has {actual}")]
    ConcurrentModification {
        /// Removal count the cursor last observed.
        expected: usize,
        /// Removal count found on the sequence.
        actual: usize,
    },

    /// Operation called in a state where it is not allowed.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// The producer already signalled completion.
    #[error("sequence is closed to further appends")]
    Closed,

    /// A bounded wait expired before enough elements were produced.
    #[error("timed out after {waited_ms}ms waiting for {threshold} permits")]
    Timeout {
        /// The permit threshold that was not reached.
        threshold: usize,
        /// How long the caller waited.
        waited_ms: u64,
    },

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for sequence operations.
pub type SequenceResult<T> = Result<T, SequenceError>;
