//! Failures produced by the combinators themselves.
use thiserror::Error;

/// A precondition of a composed future was not met.
///
/// Unlike an upstream failure, which combinators forward untouched, a [`Cancelled`] is created by
/// the combinator that found its precondition unsatisfied. Error types used with [`filter`],
/// [`join`], or [`Promise`] must be constructible from it.
///
/// [`filter`]: crate::futures::filter
/// [`join`]: crate::futures::join
/// [`Promise`]: crate::sync::Promise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Cancelled {
    /// The value was rejected by a [`filter`][crate::futures::filter] predicate.
    #[error("value rejected by predicate")]
    Rejected,
    /// The keys compared by [`join`][crate::futures::join] were not equal.
    #[error("join keys do not match")]
    KeyMismatch,
    /// The [`Promise`][crate::sync::Promise] was dropped before being completed.
    #[error("promise dropped before completion")]
    Abandoned,
}

impl Cancelled {
    /// Returns `true` if this is [`Cancelled::Rejected`].
    #[inline]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Returns `true` if this is [`Cancelled::KeyMismatch`].
    #[inline]
    pub const fn is_key_mismatch(&self) -> bool {
        matches!(self, Self::KeyMismatch)
    }
}

#[test]
fn test_cancelled_display() {
    assert_eq!(Cancelled::Rejected.to_string(), "value rejected by predicate");
    assert_eq!(Cancelled::KeyMismatch.to_string(), "join keys do not match");
    assert!(Cancelled::Rejected.is_rejected());
    assert!(!Cancelled::Abandoned.is_key_mismatch());
}
