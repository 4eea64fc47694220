/// Macro to capture an exception
///
/// This macro can be invoked in two different ways, using a format string or
/// using a payload value.
///
/// ## Using a format string
///
/// When invoked with a literal as the first argument, this macro will
/// interpret and evaluate the arguments in the same way as the [`format!()`]
/// macro.
///
/// The resulting string will become the payload of the new exception. The
/// resulting handle will have the type `Exception<Dynamic>`.
///
/// The inner payload will typically be a `String`, but in cases where the
/// format does not contain arguments, it is typically optimized to a
/// `&'static str` instead.
///
/// [`format!()`]: std::format
///
/// ## Using a payload value
///
/// This macro also accepts any other expression. When used like this, it is
/// mostly equivalent to calling [`capture`], however it automatically infers
/// the best handler based on the traits the payload implements: error types
/// format through their `Error` implementation, displayable types through
/// `Display`, debuggable types through `Debug`, and anything else falls back
/// to a generic type-name message.
///
/// [`capture`]: crate::capture
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
///
/// use caught::prelude::*;
///
/// let exception = exception!("Something broke");
/// assert_eq!(exception.type_id(), TypeId::of::<&'static str>());
///
/// let exception = exception!("Something broke hard: {}", "it was bad");
/// assert_eq!(exception.type_id(), TypeId::of::<String>());
///
/// # fn something_that_fails() -> Result<(), std::io::Error> {
/// #    std::fs::read("/nonexistant")?; Ok(())
/// # }
/// let io_error: std::io::Error = something_that_fails().unwrap_err();
/// let exception: Exception<std::sync::Arc<std::io::Error>> =
///     exception!(std::sync::Arc::new(io_error));
/// ```
#[macro_export]
macro_rules! exception {
    ($msg:literal $(,)?) => {
        $crate::__private::format_exception($crate::__private::format_args!($msg))
    };
    ($value:expr $(,)?) => {
        {
            use $crate::__private::kind::*;
            let value = $value;
            let handler = (&&&&Wrap(&value)).handler();
            macro_helper_capture(handler, value)
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Exception::<_>::new_custom::<$crate::handlers::Display>(
            $crate::__private::format!($fmt, $($arg)*)
        ).into_dynamic()
    };
}

/// Capture an exception and immediately rethrow it.
///
/// This macro constructs a new exception using the same arguments as the
/// [`exception!`] macro, and then raises it as a real unwinding panic. A
/// [`catch_unwind`] further up the stack receives the payload with its exact
/// concrete type.
///
/// This is equivalent to writing `exception!(...).rethrow()`.
///
/// [`catch_unwind`]: std::panic::catch_unwind
///
/// # Examples
///
/// ```should_panic
/// use caught::prelude::*;
///
/// fn do_something(value: i32) {
///     if value < 0 {
///         throw!("Value must be non-negative, got {}", value);
///     }
/// }
///
/// do_something(-1);
/// ```
#[cfg(feature = "std")]
#[macro_export]
macro_rules! throw {
    ($($args:tt)*) => {
        $crate::exception!($($args)*).rethrow()
    };
}
