use std::{error::Error, fmt, ops::Deref};

use super::{TraceFrame, render_frames};
use crate::error::Cancelled;

/// An error value that can carry an asynchronous call chain.
///
/// Implemented by [`Traced`], custom error types may implement it to be used with
/// [`with_trace`][super::with_trace] directly.
pub trait Traceable {
    /// Returns the same error with `frame` appended to the call chain.
    fn with_frame(self, frame: TraceFrame) -> Self;

    /// Returns the recorded frames, oldest first.
    fn frames(&self) -> &[TraceFrame];
}

/// Error augmented with an asynchronous call chain.
///
/// The error starts [`Plain`][Traced::Plain] and becomes [`Traced`][Traced::Traced] when the
/// first frame is appended. Frames are kept in append order and never reordered or deduplicated.
///
/// Equality against `E` and [`Deref`] only observe the underlying error, so a handler that does
/// not care about the trace sees the original failure.
#[derive(Debug, Clone)]
pub enum Traced<E> {
    /// No frame recorded yet.
    Plain(E),
    /// Underlying error with recorded frames.
    Traced(E, Vec<TraceFrame>),
}

impl<E> Traced<E> {
    /// Create new [`Traced`] without any frame.
    #[inline]
    pub const fn new(error: E) -> Self {
        Self::Plain(error)
    }

    /// Returns the underlying error.
    #[inline]
    pub fn error(&self) -> &E {
        match self {
            Self::Plain(e) | Self::Traced(e, _) => e,
        }
    }

    /// Returns the underlying error, discarding the trace.
    #[inline]
    pub fn into_inner(self) -> E {
        match self {
            Self::Plain(e) | Self::Traced(e, _) => e,
        }
    }

    /// Split into the underlying error and the frames.
    pub fn into_parts(self) -> (E, Vec<TraceFrame>) {
        match self {
            Self::Plain(e) => (e, Vec::new()),
            Self::Traced(e, frames) => (e, frames),
        }
    }

    /// Map the underlying error, keeping the trace.
    pub fn map<E2, F: FnOnce(E) -> E2>(self, f: F) -> Traced<E2> {
        match self {
            Self::Plain(e) => Traced::Plain(f(e)),
            Self::Traced(e, frames) => Traced::Traced(f(e), frames),
        }
    }

    /// Render the frames alone, newline-joined, oldest first.
    ///
    /// Returns an empty string when no frame is recorded.
    #[inline]
    pub fn stack_trace(&self) -> String {
        render_frames(self.frames())
    }
}

impl<E> Traceable for Traced<E> {
    fn with_frame(self, frame: TraceFrame) -> Self {
        match self {
            Self::Plain(e) => Self::Traced(e, vec![frame]),
            Self::Traced(e, mut frames) => {
                frames.push(frame);
                Self::Traced(e, frames)
            }
        }
    }

    #[inline]
    fn frames(&self) -> &[TraceFrame] {
        match self {
            Self::Plain(_) => &[],
            Self::Traced(_, frames) => frames,
        }
    }
}

impl<E: From<Cancelled>> From<Cancelled> for Traced<E> {
    #[inline]
    fn from(value: Cancelled) -> Self {
        Self::Plain(E::from(value))
    }
}

impl<E> Deref for Traced<E> {
    type Target = E;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.error()
    }
}

impl<E: PartialEq> PartialEq for Traced<E> {
    /// Frames are ignored, two errors are equal regardless of where they were observed.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.error() == other.error()
    }
}

impl<E: PartialEq> PartialEq<E> for Traced<E> {
    #[inline]
    fn eq(&self, other: &E) -> bool {
        self.error() == other
    }
}

impl<E: fmt::Display> fmt::Display for Traced<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error())?;
        let frames = self.frames();
        if !frames.is_empty() {
            f.write_str("\n--- Async stack trace:")?;
            for frame in frames {
                write!(f, "\n\t{frame}")?;
            }
        }
        Ok(())
    }
}

impl<E: Error + 'static> Error for Traced<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error().source()
    }
}

#[test]
fn test_traced_render() {
    let err = Traced::new("connection reset");
    assert_eq!(err.stack_trace(), "");
    assert_eq!(err.to_string(), "connection reset");
    assert!(err.frames().is_empty());

    let err = err
        .with_frame(TraceFrame::new("read", "io.rs", 10))
        .with_frame(TraceFrame::new("fetch", "net.rs", 42));
    assert_eq!(err.stack_trace(), "read at io.rs:10\nfetch at net.rs:42");
    assert_eq!(
        err.to_string(),
        "connection reset\n--- Async stack trace:\n\tread at io.rs:10\n\tfetch at net.rs:42"
    );
}

#[test]
fn test_traced_identity() {
    let err = Traced::new(Cancelled::KeyMismatch).with_frame(TraceFrame::new("join", "a.rs", 1));
    assert_eq!(err, Cancelled::KeyMismatch);
    assert!(err.is_key_mismatch());
    assert_eq!(err.frames().len(), 1);

    let (inner, frames) = err.map(|e| e.to_string()).into_parts();
    assert_eq!(inner, "join keys do not match");
    assert_eq!(frames, [TraceFrame::new("join", "a.rs", 1)]);

    let err: Traced<Cancelled> = Cancelled::Rejected.into();
    assert!(matches!(err, Traced::Plain(Cancelled::Rejected)));
}

#[test]
fn test_traced_eq_ignores_frames() {
    let plain = Traced::new(Cancelled::Rejected);
    let traced = Traced::new(Cancelled::Rejected).with_frame(TraceFrame::new("filter", "a.rs", 3));
    assert_eq!(plain, traced);
    assert_ne!(traced, Traced::new(Cancelled::Abandoned));

    let outcome: Result<u8, _> = Err(traced);
    assert_eq!(outcome, Err(plain));
}
