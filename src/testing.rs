use std::{
    pin::pin,
    task::{Context, Poll, Waker},
};

use crate::error::Cancelled;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum TestError {
    #[error("fault: {0}")]
    Fault(&'static str),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl TestError {
    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Poll once with a noop waker.
pub(crate) fn poll_ready<F: Future>(f: F) -> Option<F::Output> {
    match pin!(f).poll(&mut Context::from_waker(Waker::noop())) {
        Poll::Ready(ok) => Some(ok),
        Poll::Pending => None,
    }
}
