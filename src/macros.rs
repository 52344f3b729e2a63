// ===== Logging =====

macro_rules! trace {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        log::trace!(target: "futrace", $($tt)*);
    };
}

macro_rules! debug {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        log::debug!(target: "futrace", $($tt)*);
    };
}

pub(crate) use {debug, trace};

// ===== Call site =====

/// Create a [`TraceFrame`][crate::trace::TraceFrame] describing the current call site.
///
/// Without argument, the caller name is the path of the enclosing function, resolved at compile
/// time. An explicit name can be given instead.
///
/// # Example
///
/// ```
/// let frame = futrace::frame!("load_user");
/// assert_eq!(frame.caller_name(), "load_user");
/// assert_eq!(frame.source_location(), file!());
///
/// fn handler() -> futrace::trace::TraceFrame {
///     futrace::frame!()
/// }
/// assert!(handler().caller_name().ends_with("handler"));
/// ```
#[macro_export]
macro_rules! frame {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::trace::TraceFrame::from_fn_path(__type_name_of(__here), file!(), line!())
    }};
    ($name:expr) => {
        $crate::trace::TraceFrame::new($name, file!(), line!())
    };
}

/// Wrap a future with [`with_trace`][crate::trace::with_trace] using the current call site.
///
/// # Example
///
/// ```
/// use futrace::{futures::fail, trace::{Traceable, Traced}};
///
/// # async fn app() {
/// let fut = fail::<(), Traced<&str>>(Traced::new("not found"));
/// let err = futrace::with_trace!(fut, "lookup").await.unwrap_err();
/// assert_eq!(err.frames()[0].caller_name(), "lookup");
/// # }
/// # assert!(matches!(
/// #     std::pin::pin!(app())
/// #         .poll(&mut std::task::Context::from_waker(std::task::Waker::noop())),
/// #     std::task::Poll::Ready(())
/// # ));
/// ```
#[macro_export]
macro_rules! with_trace {
    ($fut:expr) => {
        $crate::trace::with_trace($fut, $crate::frame!())
    };
    ($fut:expr, $name:expr) => {
        $crate::trace::with_trace($fut, $crate::frame!($name))
    };
}
