//! # Synchronization Primitives for Lazy Sequences
//!
//! ## The Problem
//!
//! ```text
//! Producer:  append(0) ... append(1) ........ append(2) .. done()
//! Consumer:  get(2) ─────────────── must wait ─────────────► element 2
//! Consumer:  get(7) ─────────────── must wait ──────────────────► OutOfRange
//! ```
//!
//! Reading early returns garbage. Polling burns a core.
//!
//! ## The Solution: A Permit Gate
//!
//! Every append publishes one permit. A read of index `i` waits for `i + 1`
//! permits. Completion publishes infinitely many, so nobody waits forever.

mod gate;

pub use gate::Gate;
