use std::{
    borrow::Cow,
    fmt::{self, Write},
};

/// One logical call site of an asynchronous call chain.
///
/// Usually created by the [`frame!`][crate::frame] macro, which resolves the call site at compile
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceFrame {
    caller_name: Cow<'static, str>,
    source_location: Cow<'static, str>,
    line: u32,
}

impl TraceFrame {
    /// Create new [`TraceFrame`].
    #[inline]
    pub fn new(
        caller_name: impl Into<Cow<'static, str>>,
        source_location: impl Into<Cow<'static, str>>,
        line: u32,
    ) -> Self {
        Self {
            caller_name: caller_name.into(),
            source_location: source_location.into(),
            line,
        }
    }

    /// Create new [`TraceFrame`] from the type name of a function item nested in the caller.
    ///
    /// Used by [`frame!`][crate::frame], the nested item and any `{{closure}}` segment introduced
    /// by `async` blocks are stripped.
    #[doc(hidden)]
    pub fn from_fn_path(path: &'static str, source_location: &'static str, line: u32) -> Self {
        let mut name = path.strip_suffix("::__here").unwrap_or(path);
        while let Some(outer) = name.strip_suffix("::{{closure}}") {
            name = outer;
        }
        Self::new(name, source_location, line)
    }

    /// Returns the name of the calling function.
    #[inline]
    pub fn caller_name(&self) -> &str {
        &self.caller_name
    }

    /// Returns the source file of the call site.
    #[inline]
    pub fn source_location(&self) -> &str {
        &self.source_location
    }

    /// Returns the line of the call site.
    #[inline]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.caller_name, self.source_location, self.line)
    }
}

/// Render frames newline-joined, oldest first.
///
/// An empty slice renders as an empty string.
///
/// # Example
///
/// ```
/// use futrace::trace::{TraceFrame, render_frames};
///
/// let frames = [TraceFrame::new("a", "a.rs", 1), TraceFrame::new("b", "b.rs", 2)];
/// assert_eq!(render_frames(&frames), "a at a.rs:1\nb at b.rs:2");
/// assert_eq!(render_frames(&[]), "");
/// ```
pub fn render_frames(frames: &[TraceFrame]) -> String {
    let mut out = String::new();
    for (i, frame) in frames.iter().enumerate() {
        if i != 0 {
            out.push('\n');
        }
        // writing into a `String` is infallible
        let _ = write!(out, "{frame}");
    }
    out
}

#[test]
fn test_frame_from_fn_path() {
    let frame = TraceFrame::from_fn_path("app::users::load::{{closure}}::__here", "users.rs", 12);
    assert_eq!(frame.caller_name(), "app::users::load");
    assert_eq!(frame.source_location(), "users.rs");
    assert_eq!(frame.line(), 12);
    assert_eq!(frame.to_string(), "app::users::load at users.rs:12");
}

#[test]
fn test_frame_macro() {
    fn lookup() -> TraceFrame {
        crate::frame!()
    }

    let frame = lookup();
    assert!(frame.caller_name().ends_with("test_frame_macro::lookup"));
    assert_eq!(frame.source_location(), file!());

    let frame = async { crate::frame!() };
    let frame = crate::testing::poll_ready(frame).unwrap();
    assert!(frame.caller_name().ends_with("test_frame_macro"));
}
