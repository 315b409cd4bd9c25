//! # Lazy Collections
//!
//! Sequences that are read while they are still being produced.
//!
//! ## Design Philosophy
//!
//! - One producer appends, any number of consumers read
//! - A read of an element that does not exist yet waits, it never guesses
//! - Completion is explicit and releases every waiting reader

mod cursor;
mod lazy_vec;
mod producer;
mod store;
mod view;

pub use cursor::{Cursor, CursorState};
pub use lazy_vec::LazyVec;
pub use producer::Producer;
pub use store::BackingStore;
pub use view::SequenceView;
