#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Opaque, shareable, rethrowable exception handles for Rust.
//!
//! ## Overview
//!
//! This crate provides a way to capture an arbitrary value as an exception:
//! an opaque, reference-counted handle that hides the value's concrete type
//! while preserving it exactly. The handle can be stored, cloned cheaply,
//! sent across threads, and later rethrown as a real unwinding panic that
//! delivers the original value, with its original type, to a catch site.
//!
//! This mirrors the exception-pointer idiom found in other languages: an
//! error is caught in one place, carried around as an opaque token, and
//! re-raised somewhere else without either place needing to agree on the
//! error's type.
//!
//! ## Quick Example
//!
//! ```
//! use caught::prelude::*;
//!
//! // Capture any eligible value as an opaque handle
//! let exception = caught::capture(42i32).into_dynamic();
//!
//! // The handle can be cloned, stored, and sent to other threads
//! let stored = exception.clone();
//!
//! // Rethrowing delivers the value with its exact original type
//! let payload = std::panic::catch_unwind(|| exception.rethrow()).unwrap_err();
//! assert_eq!(*payload.downcast::<i32>().unwrap(), 42);
//!
//! // The stored handle still works and can be inspected directly
//! assert_eq!(stored.downcast_ref::<i32>(), Some(&42));
//! ```
//!
//! ## Core Concepts
//!
//! An [`Exception`] handle contains exactly one captured value together with
//! a formatting handler chosen at capture time. Three things can happen to a
//! handle:
//!
//! - **Sharing**: cloning a handle is a reference count increment. All clones
//!   observe the same stored value.
//! - **Inspection**: the payload's [`TypeId`](core::any::TypeId) is always
//!   available, and a dynamic handle can be downcast back to a typed one with
//!   [`Exception::downcast`]. Formatting goes through the capture-time
//!   handler, so even payloads with no formatting traits print something
//!   useful.
//! - **Rethrowing**: [`Exception::rethrow`] raises the payload as a real
//!   unwinding panic. Each rethrow mints a fresh owned copy of the payload,
//!   so a handle can be rethrown any number of times.
//!
//! For implementation details, see the [`caught-internals`] crate.
//!
//! [`caught-internals`]: caught_internals
//!
//! ## Capture Requirements
//!
//! A value is eligible for capture when it satisfies
//! [`Throwable`](markers::Throwable), which is automatically implemented for
//! every `Clone + Send + Sync + 'static` type. `Clone` is what allows a
//! shared handle to mint an owned payload on every rethrow; `Send + Sync`
//! is what makes the handle freely shareable across threads. Capture itself
//! never fails and never panics (short of allocation failure aborting the
//! process).
//!
//! ## Crate Features
//!
//! - **`std`** (enabled by default): Provides [`Exception::rethrow`] and the
//!   [`throw!`] macro, which rely on the standard library's unwinding
//!   machinery. Without this feature the crate is `no_std` (plus `alloc`),
//!   and handles can still be created, shared, and inspected.
//!
//! ## Project Goals
//!
//! - **Total capture**: Any eligible value can be captured, with no
//!   formatting trait requirements.
//! - **Type fidelity**: A rethrown payload downcast at the catch site has
//!   exactly the type that was captured.
//! - **Shareable**: Handles are `Send + Sync` and cheap to clone.
//! - **Inspectable**: Payloads can be examined without rethrowing.
//! - **Lightweight**: [`Exception`] has a pointer-sized representation,
//!   keeping `Result<T, Exception>` small and fast.

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

#[macro_use]
mod macros;

pub mod handlers;
pub mod markers;
pub mod prelude;

mod exception;

pub use self::exception::{owned::Exception, ref_::ExceptionRef};

use crate::markers::Throwable;

/// Captures the given value as an [`Exception`] handle.
///
/// This is the universal entry point: it works for any value satisfying
/// [`Throwable`](markers::Throwable), with no formatting trait requirements.
/// The handle formats through the [`handlers::Any`] handler, showing the
/// payload's type name.
///
/// See also:
///
/// - The [`exception!()`] macro auto-detects a better formatting handler
///   based on the traits the payload implements.
/// - [`Exception::new`] uses the [`handlers::Error`] handler for payloads
///   that are error types.
///
/// [`exception!()`]: crate::exception!
///
/// # Examples
///
/// ```
/// use caught::Exception;
///
/// // Works even for types with no Display, Debug, or Error implementation
/// #[derive(Clone)]
/// struct Opaque(u16);
///
/// let exception: Exception<Opaque> = caught::capture(Opaque(7));
/// assert_eq!(exception.value().0, 7);
/// ```
#[must_use]
pub fn capture<E>(value: E) -> Exception<E>
where
    E: Throwable,
{
    Exception::new_custom::<handlers::Any>(value)
}

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    use alloc::fmt;
    #[doc(hidden)]
    pub use alloc::format;
    #[doc(hidden)]
    pub use core::format_args;

    use crate::{Exception, handlers, markers::Dynamic};

    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub fn format_exception(args: fmt::Arguments<'_>) -> Exception<Dynamic> {
        if let Some(message) = args.as_str() {
            Exception::new_custom::<handlers::Display>(message).into_dynamic()
        } else {
            Exception::new_custom::<handlers::Display>(fmt::format(args)).into_dynamic()
        }
    }

    #[doc(hidden)]
    pub mod kind {
        use crate::{Exception, handlers, markers::Throwable};

        #[doc(hidden)]
        pub struct Wrap<'a, E>(pub &'a E);

        #[doc(hidden)]
        pub trait HandlerErrorKind {
            #[inline(always)]
            fn handler(&self) -> handlers::Error {
                handlers::Error
            }
        }

        impl<E> HandlerErrorKind for &&&Wrap<'_, E> where handlers::Error: handlers::ExceptionHandler<E> {}

        #[doc(hidden)]
        pub trait HandlerDisplayKind {
            #[inline(always)]
            fn handler(&self) -> handlers::Display {
                handlers::Display
            }
        }

        impl<E> HandlerDisplayKind for &&Wrap<'_, E> where
            handlers::Display: handlers::ExceptionHandler<E>
        {
        }

        #[doc(hidden)]
        pub trait HandlerDebugKind {
            #[inline(always)]
            fn handler(&self) -> handlers::Debug {
                handlers::Debug
            }
        }

        impl<E> HandlerDebugKind for &Wrap<'_, E> where handlers::Debug: handlers::ExceptionHandler<E> {}

        #[doc(hidden)]
        pub trait HandlerAnyKind {
            #[inline(always)]
            fn handler(&self) -> handlers::Any {
                handlers::Any
            }
        }

        impl<E> HandlerAnyKind for Wrap<'_, E> where handlers::Any: handlers::ExceptionHandler<E> {}

        #[doc(hidden)]
        #[must_use]
        pub fn macro_helper_capture<H, E>(_handler: H, value: E) -> Exception<E>
        where
            H: handlers::ExceptionHandler<E>,
            E: Throwable,
        {
            Exception::new_custom::<H>(value)
        }
    }
}
