//! Marker types and traits describing what can be captured in an exception
//! handle.
//!
//! # Design Philosophy
//!
//! The constraints encoded here are enforced at construction time. It is
//! impossible to construct an [`Exception`](crate::Exception) whose payload
//! violates the [`Throwable`] contract. This means you can trust that every
//! exception handle is `Send + Sync` and can mint a fresh payload for
//! rethrowing, no matter how it reached you.

/// Marker type signaling that the payload type of an
/// [`Exception`](crate::Exception) is not statically known.
///
/// `Dynamic` is just a type-level marker. No actual instance of `Dynamic` is
/// ever stored inside an exception handle; the handle still holds the concrete
/// value it was created with, and that value can be recovered with
/// [`Exception::downcast`](crate::Exception::downcast).
///
/// Converting between typed and dynamic handles is zero-cost: both are a
/// single pointer to the same allocation.
///
/// # Examples
///
/// ```
/// use caught::{Exception, markers::Dynamic};
///
/// let exception: Exception<&'static str> = caught::capture("boom");
/// let dynamic: Exception<Dynamic> = exception.into_dynamic();
/// assert!(dynamic.is::<&'static str>());
/// ```
pub struct Dynamic([()]);

/// Trait for values that can be captured into an
/// [`Exception`](crate::Exception) handle.
///
/// This trait is automatically implemented for every type satisfying the
/// capture constraints, so you never implement it by hand. The individual
/// bounds exist for the following reasons:
///
/// - **`Clone`**: Rethrowing delivers an owned payload to the catch site, and
///   a shared handle must be able to produce one on every rethrow without
///   giving up the stored value.
/// - **`Send + Sync`**: Exception handles are freely shareable across threads,
///   so the captured value must be too.
/// - **`'static`**: The handle owns its payload and can outlive any borrow.
///
/// # Examples
///
/// ```
/// use caught::markers::Throwable;
///
/// fn assert_throwable<E: Throwable>() {}
///
/// assert_throwable::<i32>();
/// assert_throwable::<String>();
/// assert_throwable::<std::sync::Arc<str>>();
/// ```
pub trait Throwable: Clone + Send + Sync + 'static {}

impl<E> Throwable for E where E: Clone + Send + Sync + 'static {}
