//! Future combinators with asynchronous call chain tracing.
//!
//! - [`futures`]: `map`, `bind`, `filter`, `join` and `group_join` over futures resolving to a
//!   [`Result`], a failed input is always forwarded untouched.
//! - [`trace`]: reconstruct the logical call chain of an error across `.await` points.
//! - [`sync`]: a cloneable, resolve-once [`Shared`][sync::Shared] handle with continuation
//!   registration.
#![warn(missing_docs, missing_debug_implementations)]

mod macros;

mod error;

pub mod futures;
pub mod sync;
pub mod trace;

#[cfg(feature = "tokio")]
pub mod tokio;

#[cfg(test)]
mod testing;

pub use error::Cancelled;
