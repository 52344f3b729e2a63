use super::{
    Bind, Filter, GroupJoin, Join, Map, MapErr, Matching, SelectMany, bind, filter, group_join,
    join, map, map_err, select_many,
};
use crate::{
    error::Cancelled,
    trace::{TraceFrame, Traceable, WithTrace, with_trace},
};

/// Method chaining for [`Future`]s resolving to a [`Result`].
///
/// Every method is the method form of the free function of the same name in
/// [`futures`][crate::futures] or [`trace`][crate::trace].
///
/// # Example
///
/// ```
/// use futrace::{Cancelled, futures::{Combinators, unit}, trace::Traced};
///
/// # async fn app() {
/// let result = unit::<_, Traced<Cancelled>>(20)
///     .map(|x| x * 2)
///     .filter(|x| *x > 10)
///     .bind(|x| unit(x + 2))
///     .with_trace(futrace::frame!("answer"))
///     .await;
/// assert_eq!(result.unwrap(), 42);
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
pub trait Combinators<T, E>: Future<Output = Result<T, E>> + Sized {
    /// See [`map`][super::map()].
    #[inline]
    fn map<M, U>(self, m: M) -> Map<Self, M>
    where
        M: FnOnce(T) -> U,
    {
        map(self, m)
    }

    /// See [`map_err`][super::map_err()].
    #[inline]
    fn map_err<M, E2>(self, m: M) -> MapErr<Self, M>
    where
        M: FnOnce(E) -> E2,
    {
        map_err(self, m)
    }

    /// See [`bind`][super::bind()].
    #[inline]
    fn bind<K, F2, U>(self, then: K) -> Bind<Self, K, F2>
    where
        K: FnOnce(T) -> F2,
        F2: Future<Output = Result<U, E>>,
    {
        bind(self, then)
    }

    /// See [`filter`][super::filter()].
    #[inline]
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        P: FnOnce(&T) -> bool,
        E: From<Cancelled>,
    {
        filter(self, predicate)
    }

    /// See [`select_many`][super::select_many()].
    #[inline]
    fn select_many<K, F2, P, U, V>(self, then: K, project: P) -> SelectMany<Self, K, F2, P, T>
    where
        K: FnOnce(&T) -> F2,
        F2: Future<Output = Result<U, E>>,
        P: FnOnce(T, U) -> V,
    {
        select_many(self, then, project)
    }

    /// See [`join`][super::join()].
    #[inline]
    fn join<B, KA, KB, C, U, K, V>(
        self,
        other: B,
        key_a: KA,
        key_b: KB,
        combine: C,
    ) -> Join<Self, B, KA, KB, C>
    where
        B: Future<Output = Result<U, E>>,
        KA: FnOnce(&T) -> K,
        KB: FnOnce(&U) -> K,
        K: PartialEq,
        C: FnOnce(T, U) -> V,
        E: From<Cancelled>,
    {
        join(self, other, key_a, key_b, combine)
    }

    /// See [`group_join`][super::group_join()].
    #[inline]
    fn group_join<B, KA, KB, C, U, K, V>(
        self,
        other: B,
        key_a: KA,
        key_b: KB,
        combine: C,
    ) -> GroupJoin<Self, B, KA, KB, C>
    where
        B: Future<Output = Result<U, E>>,
        KA: FnOnce(&T) -> K,
        KB: FnOnce(&U) -> K,
        K: PartialEq,
        C: FnOnce(T, Matching<B, K, KB>) -> V,
    {
        group_join(self, other, key_a, key_b, combine)
    }

    /// See [`with_trace`][crate::trace::with_trace()].
    #[inline]
    fn with_trace(self, frame: TraceFrame) -> WithTrace<Self>
    where
        E: Traceable,
    {
        with_trace(self, frame)
    }
}

impl<F, T, E> Combinators<T, E> for F where F: Future<Output = Result<T, E>> {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        futures::{fail, unit},
        testing::{TestError, poll_ready},
        trace::Traced,
    };

    #[test]
    fn test_chain_propagates_first_failure() {
        let mut later = 0;
        let fut = fail::<i32, _>(Traced::new(TestError::Fault("db")))
            .with_trace(TraceFrame::new("query", "db.rs", 3))
            .map(|x| {
                later += 1;
                x
            })
            .filter(|_| true)
            .with_trace(TraceFrame::new("handler", "api.rs", 9));

        let err = poll_ready(fut).unwrap().unwrap_err();
        assert_eq!(later, 0);
        assert_eq!(err, TestError::Fault("db"));
        assert_eq!(err.stack_trace(), "query at db.rs:3\nhandler at api.rs:9");
    }

    #[test]
    fn test_chain_rejection_is_traced() {
        let fut = unit::<_, Traced<TestError>>(3)
            .filter(|x| *x > 5)
            .with_trace(TraceFrame::new("check", "a.rs", 1));

        let err = poll_ready(fut).unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.frames().len(), 1);
    }

    #[test]
    fn test_chain_join() {
        let fut = unit::<_, TestError>((1, "a"))
            .join(unit((1, "b")), |t| t.0, |u| u.0, |t, u| [t.1, u.1].concat())
            .map_err(Traced::new);
        assert_eq!(poll_ready(fut).unwrap().unwrap(), "ab");
    }
}
