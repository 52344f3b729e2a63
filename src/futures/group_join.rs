use std::{
    pin::Pin,
    task::{Context, Poll},
};

use super::filter::{Filter, KeyEq};

/// The lazily filtered right hand side passed to the `combine` closure of [`group_join`].
pub type Matching<B, K, KB> = Filter<Remaining<B>, KeyEq<K, KB>>;

/// Group join of two [`Future`]s on a key.
///
/// Only `a` is awaited, but `b` is driven alongside it while `a` is pending. Once `a` succeeds,
/// `combine` receives its value together with `b` filtered on `key_b(&u) == key_a(&t)`. The
/// filter only applies when the caller awaits the [`Matching`] future, which resumes `b` if it
/// is not yet complete, and fails with [`Cancelled::Rejected`][crate::Cancelled::Rejected] on a
/// key mismatch.
///
/// If `a` fails, its error is forwarded, `b` is dropped and `combine` is not invoked.
///
/// # Example
///
/// ```
/// # async fn app() {
/// use futrace::{Cancelled, futures::{group_join, unit}};
///
/// let user = unit::<_, Cancelled>((7, "ana"));
/// let order = unit::<_, Cancelled>((7, 1200));
///
/// let pending = group_join(user, order, |u| u.0, |o| o.0, |user, orders| (user.1, orders))
///     .await
///     .unwrap();
/// assert_eq!(pending.0, "ana");
/// assert_eq!(pending.1.await, Ok((7, 1200)));
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn group_join<A, B, KA, KB, C, T, U, K, V, E>(
    a: A,
    b: B,
    key_a: KA,
    key_b: KB,
    combine: C,
) -> GroupJoin<A, B, KA, KB, C>
where
    A: Future<Output = Result<T, E>>,
    B: Future<Output = Result<U, E>>,
    KA: FnOnce(&T) -> K,
    KB: FnOnce(&U) -> K,
    K: PartialEq,
    C: FnOnce(T, Matching<B, K, KB>) -> V,
{
    GroupJoin { a, rest: Some((Remaining::new(b), key_a, key_b, combine)) }
}

pin_project_lite::pin_project! {
    /// Future returned by [`group_join`].
    #[must_use = "futures do nothing unless polled"]
    pub struct GroupJoin<A, B, KA, KB, C>
    where
        B: Future,
    {
        #[pin]
        a: A,
        rest: Option<(Remaining<B>, KA, KB, C)>,
    }
}

impl<A, B, KA, KB, C> std::fmt::Debug for GroupJoin<A, B, KA, KB, C>
where
    A: std::fmt::Debug,
    B: Future + std::fmt::Debug,
    B::Output: std::fmt::Debug,
    KA: std::fmt::Debug,
    KB: std::fmt::Debug,
    C: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupJoin").field("a", &self.a).field("rest", &self.rest).finish()
    }
}

/// The right hand side of a [`group_join`], possibly already driven to completion.
///
/// The future is boxed so it can be handed over to [`Matching`] after being polled.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Remaining<F: Future> {
    f: Option<Pin<Box<F>>>,
    output: Option<F::Output>,
}

// `output` is never pinned
impl<F: Future> Unpin for Remaining<F> {}

impl<F: Future> Remaining<F> {
    fn new(f: F) -> Self {
        Self { f: Some(Box::pin(f)), output: None }
    }

    /// Returns `true` if the inner future already completed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.f.is_none()
    }

    fn drive(&mut self, cx: &mut Context<'_>) {
        if let Some(f) = self.f.as_mut() {
            if let Poll::Ready(output) = f.as_mut().poll(cx) {
                self.f = None;
                self.output = Some(output);
            }
        }
    }
}

impl<F: Future> Future for Remaining<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.get_mut();
        me.drive(cx);
        match me.output.take() {
            Some(output) => Poll::Ready(output),
            None if me.f.is_some() => Poll::Pending,
            None => panic!("poll after complete"),
        }
    }
}

impl<A, B, KA, KB, C, T, U, K, V, E> Future for GroupJoin<A, B, KA, KB, C>
where
    A: Future<Output = Result<T, E>>,
    B: Future<Output = Result<U, E>>,
    KA: FnOnce(&T) -> K,
    KB: FnOnce(&U) -> K,
    K: PartialEq,
    C: FnOnce(T, Matching<B, K, KB>) -> V,
{
    type Output = Result<V, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();
        let Poll::Ready(result) = me.a.poll(cx) else {
            if let Some((b, ..)) = me.rest.as_mut() {
                b.drive(cx);
            }
            return Poll::Pending;
        };
        let (b, key_a, key_b, combine) = me.rest.take().expect("poll after complete");
        match result {
            Ok(t) => {
                let key = key_a(&t);
                Poll::Ready(Ok(combine(t, Filter::new(b, KeyEq::new(key, key_b)))))
            }
            Err(err) => Poll::Ready(Err(err)),
        }
    }
}
