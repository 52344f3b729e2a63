use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

/// Chain a [`Future`] into another [`Future`] built from its success value.
///
/// `then` is invoked exactly once after `f` succeeds. When `f` fails, `then` is dropped without
/// being invoked and the error is forwarded untouched.
///
/// Together with [`unit`][super::unit], `bind` satisfies the monad laws with respect to the
/// eventual outcome: `bind(unit(x), k) == k(x)`, `bind(f, unit) == f` and
/// `bind(bind(f, k1), k2) == bind(f, |x| bind(k1(x), k2))`.
///
/// # Example
///
/// ```
/// # async fn app() {
/// use futrace::futures::{bind, unit};
/// let fut = unit::<_, ()>(112);
/// let result = bind(fut, |e| async move { Ok::<_, ()>(e.to_string()) }).await;
/// assert_eq!(result.as_deref(), Ok("112"));
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[inline]
pub fn bind<F, K, F2, T, U, E>(f: F, then: K) -> Bind<F, K, F2>
where
    F: Future<Output = Result<T, E>>,
    K: FnOnce(T) -> F2,
    F2: Future<Output = Result<U, E>>,
{
    Bind { phase: Phase::First { f }, then: Some(then) }
}

pin_project_lite::pin_project! {
    /// Future returned by [`bind`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct Bind<F, K, F2> {
        #[pin]
        phase: Phase<F, F2>,
        then: Option<K>,
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

impl<F, K, F2, T, U, E> Future for Bind<F, K, F2>
where
    F: Future<Output = Result<T, E>>,
    K: FnOnce(T) -> F2,
    F2: Future<Output = Result<U, E>>,
{
    type Output = Result<U, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut me = self.project();
        loop {
            match me.phase.as_mut().project() {
                PhaseProj::First { f } => match ready!(f.poll(cx)) {
                    Ok(ok) => {
                        let then = me.then.take().expect("poll after complete");
                        me.phase.set(Phase::Second { f: then(ok) });
                    }
                    Err(err) => {
                        me.then.take();
                        me.phase.set(Phase::Done);
                        return Poll::Ready(Err(err));
                    }
                },
                PhaseProj::Second { f } => {
                    let output = ready!(f.poll(cx));
                    me.phase.set(Phase::Done);
                    return Poll::Ready(output);
                }
                PhaseProj::Done => panic!("poll after complete"),
            }
        }
    }
}
