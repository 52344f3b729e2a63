//! Synchronization primitives.
mod promise;

pub use promise::{Promise, Shared, State, promise};
