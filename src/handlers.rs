//! Handlers that control how captured values are formatted and displayed.
//!
//! Handlers determine how a captured value is formatted when the
//! [`Exception`](crate::Exception) holding it is displayed or debugged. The
//! caught library provides several built-in handlers that cover common use
//! cases.
//!
//! # What Are Handlers?
//!
//! Handlers are types that implement the [`ExceptionHandler`] trait. They
//! define how to format a captured value, including:
//! - How to display it (via [`Display`](core::fmt::Display))
//! - How to debug-format it (via [`Debug`](core::fmt::Debug))
//! - How to navigate to its source (via
//!   [`Error::source`](core::error::Error::source))
//!
//! The handler is chosen at capture time and baked into the handle together
//! with the value type. This is what makes a fully type-erased handle
//! printable: no formatting trait bounds are needed on the erased side.
//!
//! # Built-in Handlers
//!
//! ## [`Error`]
//!
//! For types implementing [`core::error::Error`]. Delegates to the type's
//! `Display`, `Debug`, and `source` implementations. This is the default
//! handler for error types.
//!
//! ## [`Display`]
//!
//! For types implementing [`Display`](core::fmt::Display) and
//! [`Debug`](core::fmt::Debug). Useful for payloads that aren't errors, such
//! as message strings. Always returns `None` for `source`.
//!
//! ## [`struct@Debug`]
//!
//! For types implementing [`Debug`](core::fmt::Debug). Uses debug formatting
//! for the `debug` method and shows "Exception of type `TypeName`" for the
//! `display` method.
//!
//! ## [`Any`]
//!
//! For any type at all. Shows "An object of type TypeName" for both `display`
//! and `debug`. This is what makes [`capture`](crate::capture) total: a value
//! with no formatting traits whatsoever can still be captured and printed.
//!
//! # When Handlers Are Selected
//!
//! Handlers are typically selected automatically by the
//! [`exception!`](crate::exception!) macro based on the traits implemented by
//! the payload type. You can also specify a handler explicitly using
//! [`Exception::new_custom`](crate::Exception::new_custom).
//!
//! # Examples
//!
//! ```rust
//! use std::io;
//!
//! use caught::prelude::*;
//!
//! // Error handler (automatic for core::error::Error types)
//! let io_err: io::Error = io::Error::new(io::ErrorKind::NotFound, "file.txt");
//! let exception: Exception<io::Error> = exception!(io_err);
//!
//! // Display handler (automatic for Display + Debug types)
//! let msg: String = "Configuration invalid".to_string();
//! let exception2: Exception<String> = exception!(msg);
//! ```

pub use caught_internals::handlers::ExceptionHandler;

/// Handler for types implementing [`core::error::Error`].
///
/// This handler delegates to the payload type's existing implementations of
/// [`Error::source`](core::error::Error::source),
/// [`Display`](core::fmt::Display), and [`Debug`](core::fmt::Debug). This is
/// the default handler for any type that implements the `Error` trait.
///
/// # Example
///
/// ```rust
/// use std::io;
///
/// use caught::prelude::*;
///
/// let error: io::Error = io::Error::new(io::ErrorKind::NotFound, "config.toml");
/// let exception: Exception<io::Error> = exception!(error);
///
/// // The Error handler is used automatically, delegating to io::Error's Display
/// assert!(format!("{}", exception).contains("config.toml"));
/// ```
#[derive(Copy, Clone)]
pub struct Error;

impl<E> ExceptionHandler<E> for Error
where
    E: core::error::Error,
{
    fn source(value: &E) -> Option<&(dyn core::error::Error + 'static)> {
        value.source()
    }

    fn display(value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(value, f)
    }

    fn debug(value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(value, f)
    }
}

/// Handler for types implementing [`Display`](core::fmt::Display) and
/// [`Debug`](core::fmt::Debug).
///
/// This handler delegates to the type's `Display` and `Debug` implementations
/// for formatting. The [`source`](ExceptionHandler::source) method always
/// returns `None` since these types don't have error sources.
///
/// # Examples
///
/// ```rust
/// use caught::prelude::*;
///
/// // String types use the Display handler
/// let exception = exception!("Operation failed");
/// assert!(format!("{}", exception).contains("Operation failed"));
/// ```
#[derive(Copy, Clone)]
pub struct Display;

impl<E> ExceptionHandler<E> for Display
where
    E: core::fmt::Display + core::fmt::Debug,
{
    fn source(_value: &E) -> Option<&(dyn core::error::Error + 'static)> {
        None
    }

    fn display(value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(value, f)
    }

    fn debug(value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(value, f)
    }
}

/// Handler for types implementing [`Debug`](core::fmt::Debug).
///
/// This handler uses the type's `Debug` implementation for the `debug` method,
/// but shows a generic message like "Exception of type `TypeName`" for the
/// `display` method. This is useful for types that have debug information but
/// don't implement `Display`.
///
/// # Example
///
/// ```rust
/// use caught::prelude::*;
///
/// #[derive(Debug, Clone)]
/// struct InternalState {
///     connection_count: usize,
/// }
///
/// let exception: Exception<InternalState> = exception!(InternalState { connection_count: 42 });
///
/// // Display formatting shows a generic message with the type name
/// assert!(format!("{}", exception).contains("InternalState"));
/// // Debug formatting shows the full debug output
/// assert!(format!("{:?}", exception).contains("connection_count"));
/// ```
#[derive(Copy, Clone)]
pub struct Debug;

impl<E> ExceptionHandler<E> for Debug
where
    E: core::fmt::Debug,
{
    fn source(_value: &E) -> Option<&(dyn core::error::Error + 'static)> {
        None
    }

    fn display(_value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Exception of type `{}`", core::any::type_name::<E>())
    }

    fn debug(value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(value, f)
    }
}

/// Handler for any type, regardless of implemented traits.
///
/// This is the most generic handler, working with any type without requiring
/// `Display`, `Debug`, or `Error` implementations. Both `Display` and `Debug`
/// output show "An object of type TypeName" using
/// [`type_name`](core::any::type_name).
///
/// This handler is what [`capture`](crate::capture) uses, which is why capture
/// succeeds for every eligible payload type.
///
/// # Example
///
/// ```rust
/// use caught::{Exception, handlers};
///
/// #[derive(Clone)]
/// struct Opaque {
///     secret: String,
/// }
///
/// let data = Opaque {
///     secret: "password123".to_string(),
/// };
///
/// let exception: Exception<Opaque> = Exception::new_custom::<handlers::Any>(data);
///
/// // Only shows the type name, not the secret
/// let output = format!("{}", exception);
/// assert!(output.contains("Opaque"));
/// assert!(!output.contains("password123"));
/// ```
#[derive(Copy, Clone)]
pub struct Any;

impl<E> ExceptionHandler<E> for Any {
    fn source(_value: &E) -> Option<&(dyn core::error::Error + 'static)> {
        None
    }

    fn display(_value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "An object of type {}", core::any::type_name::<E>())
    }

    fn debug(_value: &E, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "An object of type {}", core::any::type_name::<E>())
    }
}
