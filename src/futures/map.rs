use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

/// Map the success value of a [`Future`].
///
/// `map` is never invoked when `f` fails, the error is forwarded untouched.
///
/// # Example
///
/// ```
/// # async fn app() {
/// use futrace::futures::{map, unit};
/// let fut = unit::<_, ()>(112);
/// let result = map(fut, |e| e.to_string()).await;
/// assert_eq!(result.as_deref(), Ok("112"));
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn map<F, M, T, U, E>(f: F, map: M) -> Map<F, M>
where
    F: Future<Output = Result<T, E>>,
    M: FnOnce(T) -> U,
{
    Map { f, map: Some(map) }
}

pin_project_lite::pin_project! {
    /// Future returned by [`map`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct Map<F, M> {
        #[pin]
        f: F,
        map: Option<M>,
    }
}

impl<F, M, T, U, E> Future for Map<F, M>
where
    F: Future<Output = Result<T, E>>,
    M: FnOnce(T) -> U,
{
    type Output = Result<U, E>;

    #[inline]
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();
        let result = ready!(me.f.poll(cx));
        let map = me.map.take().expect("poll after complete");
        Poll::Ready(result.map(map))
    }
}

/// Map the error of a [`Future`], the success value is forwarded untouched.
///
/// Useful to lift a plain error into [`Traced`][crate::trace::Traced] before wrapping a call
/// site with [`with_trace`][crate::trace::with_trace].
#[inline]
pub fn map_err<F, M, T, E, E2>(f: F, map: M) -> MapErr<F, M>
where
    F: Future<Output = Result<T, E>>,
    M: FnOnce(E) -> E2,
{
    MapErr { f, map: Some(map) }
}

pin_project_lite::pin_project! {
    /// Future returned by [`map_err`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct MapErr<F, M> {
        #[pin]
        f: F,
        map: Option<M>,
    }
}

impl<F, M, T, E, E2> Future for MapErr<F, M>
where
    F: Future<Output = Result<T, E>>,
    M: FnOnce(E) -> E2,
{
    type Output = Result<T, E2>;

    #[inline]
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();
        let result = ready!(me.f.poll(cx));
        let map = me.map.take().expect("poll after complete");
        Poll::Ready(result.map_err(map))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        futures::{fail, unit},
        testing::{TestError, poll_ready},
        trace::Traced,
    };

    #[test]
    fn test_map_success() {
        let fut = map(unit::<_, TestError>(20), |x| x * 2 + 2);
        assert_eq!(poll_ready(fut), Some(Ok(42)));
    }

    #[test]
    fn test_map_failure_skips_closure() {
        let mut called = false;
        let fut = map(fail::<u8, _>(TestError::Fault("io")), |x| {
            called = true;
            x
        });
        assert_eq!(poll_ready(fut), Some(Err(TestError::Fault("io"))));
        assert!(!called);
    }

    #[test]
    fn test_map_err_lifts_into_traced() {
        let fut = map_err(fail::<u8, _>(TestError::Fault("io")), Traced::new);
        let err = poll_ready(fut).unwrap().unwrap_err();
        assert!(matches!(err, Traced::Plain(TestError::Fault("io"))));

        let fut = map_err(unit::<_, TestError>(1), Traced::new);
        assert_eq!(poll_ready(fut).unwrap().unwrap(), 1);
    }
}
