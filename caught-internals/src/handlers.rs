//! Handler trait defining formatting and error-chaining behavior for captured
//! exception values.
//!
//! An exception handle can be constructed from any value that satisfies the
//! minimal capture constraints, including values with no formatting traits at
//! all. The handler chosen at capture time is what makes the type-erased
//! handle printable afterwards: it is baked into the vtable together with the
//! value type, so formatting never needs trait bounds on the erased side.

/// Trait for implementing formatting and error-chaining behavior for captured
/// exception values.
///
/// This trait defines how a captured value should be formatted when the handle
/// holding it is displayed or debugged, and how to navigate to its error
/// source (if any).
///
/// # When to Implement
///
/// You typically don't need to implement this trait directly. The caught
/// library provides built-in handlers (`Error`, `Display`, `Debug`, `Any`)
/// that cover most use cases.
///
/// Implement this trait when you need custom behavior the built-in handlers
/// don't provide, such as source-chain navigation for types that don't
/// implement [`core::error::Error`], or display output that differs from the
/// type's own `Display` implementation.
///
/// # Examples
///
/// ```
/// use caught_internals::handlers::ExceptionHandler;
///
/// struct StatusCode(u16);
///
/// struct StatusHandler;
///
/// impl ExceptionHandler<StatusCode> for StatusHandler {
///     fn source(_value: &StatusCode) -> Option<&(dyn std::error::Error + 'static)> {
///         None
///     }
///
///     fn display(value: &StatusCode, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "status {}", value.0)
///     }
///
///     fn debug(value: &StatusCode, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "StatusCode({})", value.0)
///     }
/// }
/// ```
pub trait ExceptionHandler<E>: 'static {
    /// Returns the underlying error source for this value, if any.
    ///
    /// This enables error chain traversal from a captured value to its
    /// underlying cause. Handlers for types implementing
    /// [`core::error::Error`] delegate to the type's own `source` method;
    /// handlers for plain values return `None`.
    fn source(value: &E) -> Option<&(dyn core::error::Error + 'static)>;

    /// Formats the captured value using display-style formatting.
    ///
    /// Called when the handle is formatted with `{}`. Should produce
    /// human-readable output suitable for end users.
    fn display(value: &E, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result;

    /// Formats the captured value using debug-style formatting.
    ///
    /// Called when the handle is formatted with `{:?}`. Should produce
    /// detailed output suitable for developers.
    fn debug(value: &E, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result;
}
