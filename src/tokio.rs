//! Integration with [`tokio`][<https://docs.rs/tokio>] crate.
use tokio::runtime::Handle;

use crate::{
    error::Cancelled,
    sync::{Shared, promise},
};

/// Spawn a [`Future`] on the current tokio runtime, returning a [`Shared`] of its outcome.
///
/// The future starts running immediately, regardless of whether the [`Shared`] is polled. If the
/// task panics or the runtime shuts down before it completes, the [`Shared`] fails with
/// [`Cancelled::Abandoned`].
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
#[inline]
pub fn spawn<F, T, E>(f: F) -> Shared<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + Sync + 'static,
    E: From<Cancelled> + Send + Sync + 'static,
{
    spawn_on(&Handle::current(), f)
}

/// Spawn a [`Future`] on the given runtime, returning a [`Shared`] of its outcome.
///
/// See [`spawn`] for details.
pub fn spawn_on<F, T, E>(handle: &Handle, f: F) -> Shared<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + Sync + 'static,
    E: From<Cancelled> + Send + Sync + 'static,
{
    let (promise, shared) = promise();
    handle.spawn(async move {
        promise.complete(f.await);
    });
    shared
}
