use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use crate::{error::Cancelled, macros::debug};

/// Keep the success value of a [`Future`] only if it satisfies a predicate.
///
/// The predicate is evaluated at most once, after `f` succeeds. A rejected value fails the
/// returned future with [`Cancelled::Rejected`], an upstream failure is forwarded untouched.
///
/// # Example
///
/// ```
/// # async fn app() {
/// use futrace::{Cancelled, futures::{filter, unit}};
///
/// let result = filter(unit::<_, Cancelled>(4), |x| *x > 0).await;
/// assert_eq!(result, Ok(4));
///
/// let result = filter(unit::<_, Cancelled>(-1), |x| *x > 0).await;
/// assert_eq!(result, Err(Cancelled::Rejected));
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn filter<F, P, T, E>(f: F, predicate: P) -> Filter<F, P>
where
    F: Future<Output = Result<T, E>>,
    P: FnOnce(&T) -> bool,
    E: From<Cancelled>,
{
    Filter::new(f, predicate)
}

/// A test evaluated once against the success value of a [`Filter`].
pub trait Predicate<T> {
    /// Returns `true` if `value` should be kept.
    fn test(self, value: &T) -> bool;
}

impl<T, P: FnOnce(&T) -> bool> Predicate<T> for P {
    #[inline]
    fn test(self, value: &T) -> bool {
        self(value)
    }
}

/// Predicate matching values whose key equals a given key.
///
/// Used by [`group_join`][super::group_join].
#[derive(Debug, Clone)]
pub struct KeyEq<K, KF> {
    key: K,
    key_fn: KF,
}

impl<K, KF> KeyEq<K, KF> {
    /// Create new [`KeyEq`].
    #[inline]
    pub const fn new(key: K, key_fn: KF) -> Self {
        Self { key, key_fn }
    }

    /// Returns the key values are matched against.
    #[inline]
    pub const fn key(&self) -> &K {
        &self.key
    }
}

impl<T, K: PartialEq, KF: FnOnce(&T) -> K> Predicate<T> for KeyEq<K, KF> {
    #[inline]
    fn test(self, value: &T) -> bool {
        (self.key_fn)(value) == self.key
    }
}

pin_project_lite::pin_project! {
    /// Future returned by [`filter`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct Filter<F, P> {
        #[pin]
        f: F,
        predicate: Option<P>,
    }
}

impl<F, P> Filter<F, P> {
    #[inline]
    pub(crate) fn new(f: F, predicate: P) -> Self {
        Self { f, predicate: Some(predicate) }
    }
}

impl<F, P, T, E> Future for Filter<F, P>
where
    F: Future<Output = Result<T, E>>,
    P: Predicate<T>,
    E: From<Cancelled>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();
        let result = ready!(me.f.poll(cx));
        let predicate = me.predicate.take().expect("poll after complete");
        match result {
            Ok(ok) if predicate.test(&ok) => Poll::Ready(Ok(ok)),
            Ok(_) => {
                debug!("filter predicate rejected value");
                Poll::Ready(Err(Cancelled::Rejected.into()))
            }
            Err(err) => Poll::Ready(Err(err)),
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

    #[test]
    fn test_filter_keeps_and_rejects() {
        assert_eq!(poll_ready(filter(unit::<_, TestError>(4), |x| *x > 0)), Some(Ok(4)));
        assert_eq!(
            poll_ready(filter(unit::<_, TestError>(-1), |x| *x > 0)),
            Some(Err(TestError::Cancelled(Cancelled::Rejected)))
        );
    }

    #[test]
    fn test_filter_failure_skips_predicate() {
        let mut calls = 0;
        let fut = filter(fail::<i32, _>(TestError::Fault("upstream")), |_| {
            calls += 1;
            true
        });
        assert_eq!(poll_ready(fut), Some(Err(TestError::Fault("upstream"))));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_predicate_evaluated_once() {
        let mut calls = 0;
        let fut = filter(unit::<_, TestError>("abc"), |s| {
            calls += 1;
            s.len() == 3
        });
        assert_eq!(poll_ready(fut), Some(Ok("abc")));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_key_eq() {
        let fut = Filter::new(unit::<_, TestError>((1u8, 2)), KeyEq::new(1, |v: &(u8, i32)| v.0));
        assert_eq!(poll_ready(fut), Some(Ok((1, 2))));

        let fut = Filter::new(unit::<_, TestError>((2u8, 2)), KeyEq::new(1, |v: &(u8, i32)| v.0));
        let err = poll_ready(fut).unwrap().unwrap_err();
        assert!(err.is_cancelled());
    }
}
