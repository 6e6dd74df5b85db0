/* src/core/rust/src/reactive/mod.rs */

//! Reactive cells: the only shared mutable state in rati.
//!
//! - [`Observable`]: a versioned value with subscriber callbacks and async
//!   change waiting.
//! - [`Subscription`]: RAII guard; dropping it unsubscribes.
//! - [`BatchScope`] / [`batch`]: defers notifications until the outermost
//!   scope on the current thread exits.
//!
//! Convention: each cell has exactly one writer (the router writes
//! `active_route`, a view loader writes its props); everyone else observes.

mod batch;
mod observable;

pub use batch::{BatchScope, batch};
pub use observable::{Observable, Subscription};
