use std::{
    pin::Pin,
    task::{Context, Poll},
};

/// Create an already resolved successful [`Future`].
///
/// # Example
///
/// ```
/// # async fn app() {
/// use futrace::futures::unit;
/// let result = unit::<_, ()>(112).await;
/// assert_eq!(result, Ok(112));
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn unit<T, E>(value: T) -> Unit<T, E> {
    Unit { result: Some(Ok(value)) }
}

/// Create an already resolved failed [`Future`].
#[inline]
pub fn fail<T, E>(error: E) -> Unit<T, E> {
    Unit { result: Some(Err(error)) }
}

/// Future returned by [`unit`] and [`fail`].
#[derive(Debug, Clone)]
#[must_use = "futures do nothing unless polled"]
pub struct Unit<T, E> {
    result: Option<Result<T, E>>,
}

// the result is never pinned
impl<T, E> Unpin for Unit<T, E> {}

impl<T, E> Future for Unit<T, E> {
    type Output = Result<T, E>;

    #[inline]
    fn poll(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Self::Output> {
        Poll::Ready(self.get_mut().result.take().expect("poll after complete"))
    }
}
