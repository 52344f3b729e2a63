//! Asynchronous call chain reconstruction.
//!
//! Each `.await` resumes on whichever stack the executor polls from, so a native backtrace taken
//! when an error surfaces says nothing about the chain of async functions it went through.
//! [`with_trace`] records one [`TraceFrame`] per wrapped call site as the error propagates
//! upward, producing a pseudo stack trace at the point of final observation.
//!
//! # Example
//!
//! ```
//! use futrace::{futures::fail, trace::Traced};
//!
//! async fn query() -> Result<u32, Traced<&'static str>> {
//!     fail(Traced::new("no rows")).await
//! }
//!
//! async fn handler() -> Result<u32, Traced<&'static str>> {
//!     futrace::with_trace!(query(), "handler").await
//! }
//!
//! # async fn app() {
//! let err = handler().await.unwrap_err();
//! assert_eq!(err, "no rows");
//! assert!(err.to_string().starts_with("no rows\n--- Async stack trace:\n\thandler at "));
//! # }
//! # assert!(matches!(
//! #     std::pin::pin!(app())
//! #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
//! #     std::task::Poll::Ready(())
//! # ));
//! ```
mod frame;
mod traced;
mod with_trace;

pub use frame::{TraceFrame, render_frames};
pub use traced::{Traceable, Traced};
pub use with_trace::{WithTrace, with_trace};
