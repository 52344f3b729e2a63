use std::{
    fmt, mem,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
    task::{Context, Poll, Waker},
};

use crate::{error::Cancelled, macros::debug};

/// Create a connected [`Promise`] and [`Shared`] pair.
///
/// # Examples
///
/// ```
/// use futrace::sync::{State, promise};
///
/// let (promise, shared) = promise::<u8, futrace::Cancelled>();
/// assert_eq!(shared.state(), State::Pending);
///
/// std::thread::spawn(move || promise.complete(Ok(12))).join().unwrap();
///
/// assert_eq!(shared.state(), State::Completed);
/// assert_eq!(shared.try_get(), Some(&Ok(12)));
/// ```
pub fn promise<T, E: From<Cancelled>>() -> (Promise<T, E>, Shared<T, E>) {
    let inner = Arc::new(Inner::new());
    (Promise { inner: inner.clone() }, Shared { inner, slot: None })
}

/// Observable state of a [`Shared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Not yet resolved.
    Pending,
    /// Resolved successfully.
    Completed,
    /// Resolved with an error.
    Failed,
}

// ===== Inner =====

type Continuation<T, E> = Box<dyn FnOnce(&Result<T, E>) + Send>;

enum Waiter<T, E> {
    Task(Waker),
    Continuation(Continuation<T, E>),
    /// Slot released by a dropped [`Shared`], reused by the next registering task.
    Vacant,
}

struct Inner<T, E> {
    result: OnceLock<Result<T, E>>,
    /// `None` once resolved, drained exactly once at the transition.
    waiters: Mutex<Option<Vec<Waiter<T, E>>>>,
}

impl<T, E> Inner<T, E> {
    fn new() -> Self {
        Self { result: OnceLock::new(), waiters: Mutex::new(Some(Vec::new())) }
    }

    fn resolved(result: Result<T, E>) -> Self {
        Self { result: OnceLock::from(result), waiters: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Waiter<T, E>>>> {
        // continuations never run under the lock, poisoning cannot leave a broken state
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` if already resolved.
    fn resolve(&self, result: Result<T, E>) -> bool {
        let waiters = {
            let mut waiters = self.lock();
            let Some(pending) = waiters.take() else {
                return false;
            };
            if self.result.set(result).is_err() {
                unreachable!("result set while waiters are pending");
            }
            pending
        };

        let Some(result) = self.result.get() else {
            unreachable!("result set above")
        };

        // tasks are woken first, a panicking continuation must not leave them waiting
        let mut continuations = Vec::new();
        for waiter in waiters {
            match waiter {
                Waiter::Task(waker) => waker.wake(),
                Waiter::Continuation(f) => continuations.push(f),
                Waiter::Vacant => {}
            }
        }

        let mut panicked = None;
        for f in continuations {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(result))) {
                debug!("promise continuation panicked");
                panicked.get_or_insert(payload);
            }
        }
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        true
    }

    fn state(&self) -> State {
        match self.result.get() {
            None => State::Pending,
            Some(Ok(_)) => State::Completed,
            Some(Err(_)) => State::Failed,
        }
    }
}

// ===== Promise =====

/// The producing side of a [`Shared`].
///
/// Completing consumes the promise. A promise dropped without being completed fails its
/// [`Shared`] with [`Cancelled::Abandoned`], so observers never wait forever.
pub struct Promise<T, E: From<Cancelled>> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E: From<Cancelled>> Promise<T, E> {
    /// Resolve the connected [`Shared`].
    ///
    /// Pending tasks are woken and registered continuations are run on the calling thread.
    ///
    /// # Panics
    ///
    /// If a continuation panics, the remaining continuations still run and the first panic is
    /// resumed afterwards. The [`Shared`] is resolved regardless.
    #[inline]
    pub fn complete(self, result: Result<T, E>) {
        self.inner.resolve(result);
    }

    /// Returns `true` if every [`Shared`] handle was dropped.
    #[inline]
    pub fn is_orphaned(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }
}

impl<T, E: From<Cancelled>> Drop for Promise<T, E> {
    fn drop(&mut self) {
        if self.inner.resolve(Err(Cancelled::Abandoned.into())) {
            debug!("promise dropped before completion");
        }
    }
}

impl<T, E: From<Cancelled>> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise").field("state", &self.inner.state()).finish()
    }
}

// ===== Shared =====

/// A cloneable handle to a value resolved at most once.
///
/// Every clone observes the same outcome, polling after resolution returns a clone of it again.
#[must_use = "futures do nothing unless polled"]
pub struct Shared<T, E> {
    inner: Arc<Inner<T, E>>,
    /// Index of this handle's waker in the pending list.
    slot: Option<usize>,
}

impl<T, E> Shared<T, E> {
    /// Create an already resolved [`Shared`].
    #[inline]
    pub fn resolved(result: Result<T, E>) -> Self {
        Self { inner: Arc::new(Inner::resolved(result)), slot: None }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> State {
        self.inner.state()
    }

    /// Returns `true` if resolved, successfully or not.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.state() != State::Pending
    }

    /// Returns a reference to the outcome if resolved.
    #[inline]
    pub fn try_get(&self) -> Option<&Result<T, E>> {
        self.inner.result.get()
    }

    /// Register a continuation invoked exactly once with the outcome.
    ///
    /// If already resolved, `f` runs immediately on the calling thread, otherwise it runs on the
    /// thread completing the [`Promise`].
    pub fn on_complete<F>(&self, f: F)
    where
        F: FnOnce(&Result<T, E>) + Send + 'static,
    {
        {
            let mut waiters = self.inner.lock();
            if let Some(pending) = waiters.as_mut() {
                pending.push(Waiter::Continuation(Box::new(f)));
                return;
            }
        }
        if let Some(result) = self.inner.result.get() {
            f(result);
        }
    }
}

impl<T, E> Clone for Shared<T, E> {
    #[inline]
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), slot: None }
    }
}

impl<T: Clone, E: Clone> Future for Shared<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.get_mut();
        if let Some(result) = me.inner.result.get() {
            return Poll::Ready(result.clone());
        }

        // replaced wakers are dropped after the lock is released
        let _released;
        let mut waiters = me.inner.lock();
        let Some(pending) = waiters.as_mut() else {
            return match me.inner.result.get() {
                Some(result) => Poll::Ready(result.clone()),
                None => unreachable!("waiters drained before result set"),
            };
        };

        let waker = Waiter::Task(cx.waker().clone());
        match me.slot {
            Some(i) if matches!(pending.get(i), Some(Waiter::Task(_))) => {
                _released = mem::replace(&mut pending[i], waker);
            }
            _ => match pending.iter().position(|w| matches!(w, Waiter::Vacant)) {
                Some(i) => {
                    pending[i] = waker;
                    me.slot = Some(i);
                }
                None => {
                    me.slot = Some(pending.len());
                    pending.push(waker);
                }
            },
        }
        Poll::Pending
    }
}

impl<T, E> Drop for Shared<T, E> {
    fn drop(&mut self) {
        let Some(i) = self.slot else {
            return;
        };
        let _released = match self.inner.lock().as_mut() {
            Some(pending) if matches!(pending.get(i), Some(Waiter::Task(_))) => {
                Some(mem::replace(&mut pending[i], Waiter::Vacant))
            }
            _ => None,
        };
    }
}

impl<T, E> fmt::Debug for Shared<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared").field("state", &self.state()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{TestError, poll_ready};
    use std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst},
            mpsc::sync_channel,
        },
        task::Wake,
    };

    #[test]
    fn test_resolved_is_idempotent() {
        let shared = Shared::<_, TestError>::resolved(Ok(5));
        assert_eq!(shared.state(), State::Completed);
        assert_eq!(poll_ready(shared.clone()), Some(Ok(5)));
        assert_eq!(poll_ready(shared.clone()), Some(Ok(5)));
        assert_eq!(shared.try_get(), Some(&Ok(5)));
    }

    #[test]
    fn test_pending_then_complete() {
        let (promise, shared) = promise::<u8, TestError>();
        let mut fut = std::pin::pin!(shared.clone());
        let mut cx = Context::from_waker(Waker::noop());

        assert!(fut.as_mut().poll(&mut cx).is_pending());
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        assert!(!shared.is_resolved());

        promise.complete(Err(TestError::Fault("boom")));
        assert_eq!(shared.state(), State::Failed);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(Err(TestError::Fault("boom"))));
        assert_eq!(poll_ready(shared), Some(Err(TestError::Fault("boom"))));
    }

    #[test]
    fn test_waker_slot_is_reused() {
        let (_promise, shared) = promise::<u8, TestError>();
        let mut fut = std::pin::pin!(shared.clone());
        let mut cx = Context::from_waker(Waker::noop());

        for _ in 0..3 {
            assert!(fut.as_mut().poll(&mut cx).is_pending());
        }
        assert_eq!(shared.inner.lock().as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_dropped_handles_release_slots() {
        let (_promise, shared) = promise::<u8, TestError>();
        let mut cx = Context::from_waker(Waker::noop());

        for _ in 0..1000 {
            let mut fut = shared.clone();
            assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());
        }
        assert_eq!(shared.inner.lock().as_ref().map(Vec::len), Some(1));

        // a live handle keeps its slot while a dropped one is reused
        let mut kept = shared.clone();
        assert!(Pin::new(&mut kept).poll(&mut cx).is_pending());
        let mut other = shared.clone();
        assert!(Pin::new(&mut other).poll(&mut cx).is_pending());
        assert_eq!(shared.inner.lock().as_ref().map(Vec::len), Some(2));
        assert_ne!(kept.slot, other.slot);
    }

    #[test]
    fn test_panicking_continuation_notifies_rest() {
        struct Flag(AtomicBool);

        impl Wake for Flag {
            fn wake(self: Arc<Self>) {
                self.0.store(true, SeqCst);
            }
        }

        let (promise, shared) = promise::<u8, TestError>();
        let woken = Arc::new(Flag(AtomicBool::new(false)));
        let waker = Waker::from(woken.clone());
        let mut fut = shared.clone();
        assert!(Pin::new(&mut fut).poll(&mut Context::from_waker(&waker)).is_pending());

        let calls = Arc::new(AtomicUsize::new(0));
        shared.on_complete(|_| panic!("continuation failure"));
        {
            let calls = calls.clone();
            shared.on_complete(move |_| {
                calls.fetch_add(1, SeqCst);
            });
        }

        let completed = panic::catch_unwind(AssertUnwindSafe(|| promise.complete(Ok(1))));
        assert!(completed.is_err());
        assert!(woken.0.load(SeqCst));
        assert_eq!(calls.load(SeqCst), 1);
        assert_eq!(shared.state(), State::Completed);
        assert_eq!(poll_ready(fut), Some(Ok(1)));
    }

    #[test]
    fn test_continuation_runs_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let (promise, shared) = promise::<u8, TestError>();
        shared.on_complete(|r| {
            assert_eq!(r, &Ok(1));
            CALLS.fetch_add(1, SeqCst);
        });
        assert_eq!(CALLS.load(SeqCst), 0);

        promise.complete(Ok(1));
        assert_eq!(CALLS.load(SeqCst), 1);

        // registered after resolution, runs immediately
        shared.on_complete(|_| {
            CALLS.fetch_add(1, SeqCst);
        });
        assert_eq!(CALLS.load(SeqCst), 2);
    }

    #[test]
    fn test_abandoned_promise() {
        let (promise, shared) = promise::<u8, TestError>();
        assert!(!promise.is_orphaned());
        drop(promise);
        assert_eq!(poll_ready(shared), Some(Err(TestError::Cancelled(Cancelled::Abandoned))));
    }

    #[test]
    fn test_registration_races_completion() {
        for _ in 0..64 {
            let calls = Arc::new(AtomicUsize::new(0));
            let (promise, shared) = promise::<usize, TestError>();
            let (tx, rx) = sync_channel(0);

            let registering = {
                let shared = shared.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    rx.recv().unwrap();
                    for _ in 0..8 {
                        let calls = calls.clone();
                        shared.on_complete(move |_| {
                            calls.fetch_add(1, SeqCst);
                        });
                    }
                })
            };

            tx.send(()).unwrap();
            promise.complete(Ok(3));
            registering.join().unwrap();

            assert_eq!(calls.load(SeqCst), 8);
            assert_eq!(shared.try_get(), Some(&Ok(3)));
        }
    }
}
