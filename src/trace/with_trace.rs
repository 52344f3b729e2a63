use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::{TraceFrame, Traceable};
use crate::macros::trace;

/// Record `frame` on the error if `f` fails.
///
/// On success the value is passed through unchanged. On failure the same error is returned with
/// `frame` appended to its call chain. Nested wrappers append from the innermost outwards, so the
/// frame nearest to the original failure comes first.
///
/// The [`with_trace!`][crate::with_trace] macro fills `frame` from the call site.
///
/// # Example
///
/// ```
/// use futrace::{futures::fail, trace::{TraceFrame, Traced, with_trace}};
///
/// # async fn app() {
/// let fut = fail::<u8, _>(Traced::new("timeout"));
/// let fut = with_trace(fut, TraceFrame::new("query", "db.rs", 7));
/// let fut = with_trace(fut, TraceFrame::new("handler", "api.rs", 21));
///
/// let err = fut.await.unwrap_err();
/// assert_eq!(err.stack_trace(), "query at db.rs:7\nhandler at api.rs:21");
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn with_trace<F, T, E>(f: F, frame: TraceFrame) -> WithTrace<F>
where
    F: Future<Output = Result<T, E>>,
    E: Traceable,
{
    WithTrace { f, frame: Some(frame) }
}

pin_project_lite::pin_project! {
    /// Future returned by [`with_trace`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct WithTrace<F> {
        #[pin]
        f: F,
        frame: Option<TraceFrame>,
    }
}

impl<F> WithTrace<F> {
    /// Returns the frame that will be recorded on failure.
    ///
    /// Returns [`None`] once the future completed.
    #[inline]
    pub fn frame(&self) -> Option<&TraceFrame> {
        self.frame.as_ref()
    }
}

impl<F, T, E> Future for WithTrace<F>
where
    F: Future<Output = Result<T, E>>,
    E: Traceable,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();
        let result = ready!(me.f.poll(cx));
        let frame = me.frame.take().expect("poll after complete");
        match result {
            Ok(ok) => Poll::Ready(Ok(ok)),
            Err(err) => {
                trace!("recording frame {frame}");
                Poll::Ready(Err(err.with_frame(frame)))
            }
        }
    }
}
