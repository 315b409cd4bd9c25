//! # TRICKLE Core
//!
//! Blocking growable sequences for producer/consumer pipelines:
//! - Consumers start on the first element while the rest is still produced
//! - Reads block until their element exists, never spin
//! - Completion releases every waiting reader
//!
//! ## Architecture Rules
//!
//! 1. **Gate first, store second** - no read touches the store before the gate admits it
//! 2. **Permits only grow** - the gate counter is monotonic and closing is terminal
//! 3. **Fail fast** - a cursor that lost track of the sequence reports it instead of guessing
//!
//! ## Example
//!
//! ```rust
//! use trickle_core::{LazyVec, LazyVecConfig};
//!
//! let (seq, handle) = LazyVec::<String>::spawn_producer(LazyVecConfig::default(), |producer| {
//!     for i in 0..3 {
//!         producer.push(format!("Item {i}"))?;
//!     }
//!     Ok::<_, trickle_core::SequenceError>(())
//! });
//!
//! // Starts printing as soon as "Item 0" exists.
//! for item in seq.iter() {
//!     println!("{}", item.unwrap());
//! }
//! handle.join().unwrap().unwrap();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collections;
pub mod config;
pub mod error;
pub mod sync;

pub use collections::{BackingStore, Cursor, CursorState, LazyVec, Producer, SequenceView};
pub use config::LazyVecConfig;
pub use error::{SequenceError, SequenceResult};
pub use sync::Gate;
