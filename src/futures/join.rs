use std::{
    pin::Pin,
    task::{Context, Poll},
};

use crate::{error::Cancelled, macros::debug};

/// Relational join of two [`Future`]s on a key.
///
/// Both futures are polled concurrently, and the result is only evaluated once both reached a
/// terminal state. When both succeed and `key_a(&t) == key_b(&u)`, the result is
/// `combine(t, u)`, otherwise it fails with [`Cancelled::KeyMismatch`].
///
/// If either input fails, the result fails with that error. If both fail, the error of `a` is
/// returned.
///
/// # Example
///
/// ```
/// # async fn app() {
/// use futrace::{Cancelled, futures::{join, unit}};
///
/// let a = unit::<_, Cancelled>(("a", 1));
/// let b = unit::<_, Cancelled>(("a", 2));
/// let result = join(a, b, |t| t.0, |u| u.0, |t, u| t.1 + u.1).await;
/// assert_eq!(result, Ok(3));
///
/// let a = unit::<_, Cancelled>(("a", 1));
/// let b = unit::<_, Cancelled>(("a", 2));
/// let result = join(a, b, |t| t.0, |_| "b", |t, u| t.1 + u.1).await;
/// assert_eq!(result, Err(Cancelled::KeyMismatch));
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn join<A, B, KA, KB, C, T, U, K, V, E>(
    a: A,
    b: B,
    key_a: KA,
    key_b: KB,
    combine: C,
) -> Join<A, B, KA, KB, C>
where
    A: Future<Output = Result<T, E>>,
    B: Future<Output = Result<U, E>>,
    KA: FnOnce(&T) -> K,
    KB: FnOnce(&U) -> K,
    K: PartialEq,
    C: FnOnce(T, U) -> V,
    E: From<Cancelled>,
{
    Join {
        a,
        b,
        a_output: None,
        b_output: None,
        select: Some((key_a, key_b, combine)),
    }
}

pin_project_lite::pin_project! {
    /// Future returned by [`join`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct Join<A, B, KA, KB, C>
    where
        A: Future,
        B: Future,
    {
        #[pin]
        a: A,
        #[pin]
        b: B,
        a_output: Option<A::Output>,
        b_output: Option<B::Output>,
        select: Option<(KA, KB, C)>,
    }
}

impl<A, B, KA, KB, C, T, U, K, V, E> Future for Join<A, B, KA, KB, C>
where
    A: Future<Output = Result<T, E>>,
    B: Future<Output = Result<U, E>>,
    KA: FnOnce(&T) -> K,
    KB: FnOnce(&U) -> K,
    K: PartialEq,
    C: FnOnce(T, U) -> V,
    E: From<Cancelled>,
{
    type Output = Result<V, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();
        assert!(me.select.is_some(), "poll after complete");

        if me.a_output.is_none() {
            if let Poll::Ready(ok) = me.a.poll(cx) {
                *me.a_output = Some(ok);
            }
        }
        if me.b_output.is_none() {
            if let Poll::Ready(ok) = me.b.poll(cx) {
                *me.b_output = Some(ok);
            }
        }
        if me.a_output.is_none() || me.b_output.is_none() {
            return Poll::Pending;
        }

        let (Some(a), Some(b), Some((key_a, key_b, combine))) =
            (me.a_output.take(), me.b_output.take(), me.select.take())
        else {
            unreachable!("both outputs checked above")
        };

        let (t, u) = match (a, b) {
            (Err(err), _) | (Ok(_), Err(err)) => return Poll::Ready(Err(err)),
            (Ok(t), Ok(u)) => (t, u),
        };

        if key_a(&t) == key_b(&u) {
            Poll::Ready(Ok(combine(t, u)))
        } else {
            debug!("join keys do not match");
            Poll::Ready(Err(Cancelled::KeyMismatch.into()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        futures::{fail, unit},
        testing::{TestError, poll_ready},
    };
    use std::cell::Cell;

    #[test]
    fn test_join_match_and_mismatch() {
        let fut = join(
            unit::<_, TestError>(("a", 1)),
            unit(("a", 2)),
            |t| t.0,
            |u| u.0,
            |t, u| t.1 + u.1,
        );
        assert_eq!(poll_ready(fut), Some(Ok(3)));

        let fut = join(
            unit::<_, TestError>(("a", 1)),
            unit(("a", 2)),
            |t| t.0,
            |_| "b",
            |t, u| t.1 + u.1,
        );
        assert_eq!(poll_ready(fut), Some(Err(TestError::Cancelled(Cancelled::KeyMismatch))));
    }

    #[test]
    fn test_join_failure_tie_break() {
        let fut = join(
            fail::<u8, _>(TestError::Fault("a")),
            fail::<u8, _>(TestError::Fault("b")),
            |_| (),
            |_| (),
            |t, u| t + u,
        );
        assert_eq!(poll_ready(fut), Some(Err(TestError::Fault("a"))));

        let fut = join(unit(1u8), fail(TestError::Fault("b")), |_| (), |_| (), |t, u: u8| t + u);
        assert_eq!(poll_ready(fut), Some(Err(TestError::Fault("b"))));
    }

    #[test]
    fn test_join_polls_concurrently() {
        let a_ready = Cell::new(false);
        let b_polls = Cell::new(0);

        let a = std::future::poll_fn(|_| {
            if a_ready.get() { Poll::Ready(Ok::<_, TestError>(1)) } else { Poll::Pending }
        });
        let b = std::future::poll_fn(|_| {
            b_polls.set(b_polls.get() + 1);
            Poll::Ready(Ok::<_, TestError>(2))
        });

        let mut fut = std::pin::pin!(join(a, b, |_| (), |_| (), |t, u| t + u));
        let mut cx = Context::from_waker(std::task::Waker::noop());

        // `b` makes progress while `a` is pending
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        assert_eq!(b_polls.get(), 1);

        // completed `b` is not polled again
        a_ready.set(true);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(Ok(3)));
        assert_eq!(b_polls.get(), 1);
    }

    #[test]
    fn test_join_waits_for_both_before_failing() {
        let a_ready = Cell::new(false);
        let a = std::future::poll_fn(|_| match a_ready.get() {
            true => Poll::Ready(Err::<u8, _>(TestError::Fault("a"))),
            false => Poll::Pending,
        });
        let b = fail(TestError::Fault("b"));

        let mut fut = std::pin::pin!(join(a, b, |_| (), |_| (), |t, u: u8| t + u));
        let mut cx = Context::from_waker(std::task::Waker::noop());

        assert!(fut.as_mut().poll(&mut cx).is_pending());
        a_ready.set(true);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(Err(TestError::Fault("a"))));
    }
}
