use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

/// Chain a [`Future`] into another one, then project both values into a result.
///
/// Equivalent to `bind(f, |t| map(then(&t), |u| project(t, u)))` without requiring the
/// intermediate closure to own `t`.
///
/// # Example
///
/// ```
/// # async fn app() {
/// use futrace::futures::{select_many, unit};
///
/// let user = unit::<_, ()>("ana");
/// let result = select_many(user, |name| unit(name.len()), |name, len| format!("{name}:{len}"));
/// assert_eq!(result.await.as_deref(), Ok("ana:3"));
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn select_many<F, K, F2, P, T, U, V, E>(
    f: F,
    then: K,
    project: P,
) -> SelectMany<F, K, F2, P, T>
where
    F: Future<Output = Result<T, E>>,
    K: FnOnce(&T) -> F2,
    F2: Future<Output = Result<U, E>>,
    P: FnOnce(T, U) -> V,
{
    SelectMany {
        phase: Phase::First { f },
        then: Some(then),
        select: Some(project),
        value: None,
    }
}

pin_project_lite::pin_project! {
    /// Future returned by [`select_many`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct SelectMany<F, K, F2, P, T> {
        #[pin]
        phase: Phase<F, F2>,
        then: Option<K>,
        select: Option<P>,
        value: Option<T>,
    }
}

pin_project_lite::pin_project! {
    #[project = PhaseProj]
    #[derive(Debug)]
    enum Phase<F, F2> {
        First { #[pin] f: F },
        Second { #[pin] f: F2 },
        Done,
    }
}

impl<F, K, F2, P, T, U, V, E> Future for SelectMany<F, K, F2, P, T>
where
    F: Future<Output = Result<T, E>>,
    K: FnOnce(&T) -> F2,
    F2: Future<Output = Result<U, E>>,
    P: FnOnce(T, U) -> V,
{
    type Output = Result<V, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut me = self.project();
        loop {
            match me.phase.as_mut().project() {
                PhaseProj::First { f } => match ready!(f.poll(cx)) {
                    Ok(ok) => {
                        let then = me.then.take().expect("poll after complete");
                        let next = then(&ok);
                        *me.value = Some(ok);
                        me.phase.set(Phase::Second { f: next });
                    }
                    Err(err) => {
                        me.phase.set(Phase::Done);
                        return Poll::Ready(Err(err));
                    }
                },
                PhaseProj::Second { f } => {
                    let output = ready!(f.poll(cx));
                    me.phase.set(Phase::Done);
                    let value = me.value.take().expect("poll after complete");
                    let project = me.select.take().expect("poll after complete");
                    return Poll::Ready(output.map(|u| project(value, u)));
                }
                PhaseProj::Done => panic!("poll after complete"),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        futures::{bind, fail, map, unit},
        testing::{TestError, poll_ready},
    };

    #[test]
    fn test_select_many_matches_bind_then_map() {
        let lhs = select_many(unit::<_, TestError>(4), |x| unit(x * 10), |x, y| x + y);
        let rhs = bind(unit::<_, TestError>(4), |x| map(unit(x * 10), move |y| x + y));
        assert_eq!(poll_ready(lhs), poll_ready(rhs));
    }

    #[test]
    fn test_select_many_failures() {
        let fut = select_many(
            fail::<i32, _>(TestError::Fault("first")),
            |x| unit(*x),
            |x, y: i32| x + y,
        );
        assert_eq!(poll_ready(fut), Some(Err(TestError::Fault("first"))));

        let fut = select_many(
            unit::<_, TestError>(1),
            |_| fail::<i32, _>(TestError::Fault("second")),
            |x, y| x + y,
        );
        assert_eq!(poll_ready(fut), Some(Err(TestError::Fault("second"))));
    }
}
