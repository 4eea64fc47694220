use core::any::TypeId;

use crate::{
    Exception,
    markers::{Dynamic, Throwable},
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::marker::PhantomData;

    use caught_internals::RawExceptionRef;

    use crate::markers::Dynamic;

    /// A borrowed view of an [`Exception`](crate::Exception).
    ///
    /// [`ExceptionRef`] is a `Copy` handle borrowed from an owned
    /// [`Exception`](crate::Exception). It offers the same inspection
    /// operations without touching the reference count, and can be upgraded
    /// back to an owned handle with [`clone_arc`](ExceptionRef::clone_arc).
    ///
    /// It is a single pointer, so passing it by value is as cheap as passing
    /// a reference.
    #[repr(transparent)]
    pub struct ExceptionRef<'a, E: ?Sized + 'static = Dynamic> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. `E` must either be a type bounded by `Sized`, or `Dynamic`.
        /// 2. If `E` is a `Sized` type: The value embedded in the handle must
        ///    be of type `E`.
        raw: RawExceptionRef<'a>,
        _payload: PhantomData<&'a E>,
    }

    impl<'a, E: ?Sized> ExceptionRef<'a, E> {
        /// Creates a new [`ExceptionRef`] from a [`RawExceptionRef`]
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `E` must either be a type bounded by `Sized`, or `Dynamic`.
        /// 2. If `E` is a `Sized` type: The value embedded in the handle must
        ///    be of type `E`.
        #[must_use]
        pub(crate) unsafe fn from_raw(raw: RawExceptionRef<'a>) -> Self {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            Self {
                raw,
                _payload: PhantomData,
            }
        }

        /// Returns the inner [`RawExceptionRef`].
        #[must_use]
        pub(crate) fn as_raw_ref(self) -> RawExceptionRef<'a> {
            // SAFETY: The copy is subject to the same invariants as `self`,
            // and neither the type parameter nor the pointee change.
            self.raw
        }
    }

    // SAFETY: The invariants hold for both the original and the copy, as the
    // copy points at the same stored value with the same type parameter.
    impl<'a, E: ?Sized> Copy for ExceptionRef<'a, E> {}
}
pub use limit_field_access::ExceptionRef;

impl<'a, E: ?Sized> Clone for ExceptionRef<'a, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E: Throwable> ExceptionRef<'a, E> {
    /// Returns a reference to the captured value.
    ///
    /// # Examples
    /// ```
    /// # use caught::{ExceptionRef, prelude::*};
    /// let exception: Exception<i32> = caught::capture(42);
    /// let exception_ref: ExceptionRef<'_, i32> = exception.as_ref();
    /// assert_eq!(*exception_ref.value(), 42);
    /// ```
    #[must_use]
    pub fn value(self) -> &'a E {
        let raw = self.as_raw_ref();

        // SAFETY:
        // 1. Guaranteed by the invariants of this type.
        unsafe { raw.value_downcast_unchecked() }
    }
}

impl<'a, E: ?Sized + 'static> ExceptionRef<'a, E> {
    /// Returns the [`TypeId`] of the captured value.
    #[must_use]
    pub fn type_id(self) -> TypeId {
        self.as_raw_ref().type_id()
    }

    /// Returns the [`type_name`](core::any::type_name) of the captured value.
    ///
    /// This is a best-effort diagnostic aid; use
    /// [`type_id`](ExceptionRef::type_id) for type checks.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        self.as_raw_ref().type_name()
    }

    /// Returns the [`TypeId`] of the handler the handle was created with.
    #[must_use]
    pub fn handler_type_id(self) -> TypeId {
        self.as_raw_ref().handler_type_id()
    }

    /// Returns the source of the captured value, as reported by its handler.
    #[must_use]
    pub fn source(self) -> Option<&'a (dyn core::error::Error + 'static)> {
        self.as_raw_ref().source()
    }

    /// Returns the number of owned handles currently sharing this capture.
    ///
    /// Borrowed references do not contribute to the count.
    #[must_use]
    pub fn strong_count(self) -> usize {
        self.as_raw_ref().strong_count()
    }

    /// Upgrades the borrowed reference to an owned [`Exception`].
    ///
    /// This increments the reference count; the captured value is not cloned.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception: Exception<i32> = caught::capture(42);
    /// let owned: Exception<i32> = exception.as_ref().clone_arc();
    /// assert_eq!(exception.strong_count(), 2);
    /// ```
    #[must_use]
    pub fn clone_arc(self) -> Exception<E> {
        let raw = self.as_raw_ref().clone_arc();

        // SAFETY:
        // 1. Upheld, as the type parameter does not change.
        // 2. Upheld, as the owned handle points at the same stored value.
        unsafe { Exception::from_raw(raw) }
    }

    /// Changes the payload type of the [`ExceptionRef`] to [`Dynamic`].
    ///
    /// This is a zero-cost conversion; the concrete payload is untouched.
    #[must_use]
    pub fn into_dynamic(self) -> ExceptionRef<'a, Dynamic> {
        let raw = self.as_raw_ref();

        // SAFETY:
        // 1. `E = Dynamic`, so this is trivially true.
        // 2. `E = Dynamic` is not a `Sized` type, so this is trivially true.
        unsafe { ExceptionRef::from_raw(raw) }
    }
}

impl<'a> ExceptionRef<'a, Dynamic> {
    /// Returns `true` if the captured value has type `E`.
    #[must_use]
    pub fn is<E: Throwable>(self) -> bool {
        self.type_id() == TypeId::of::<E>()
    }

    /// Returns a reference to the captured value if it has type `E`.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception = caught::capture(42i32).into_dynamic();
    /// let exception_ref = exception.as_ref();
    /// assert_eq!(exception_ref.downcast_ref::<i32>(), Some(&42));
    /// assert_eq!(exception_ref.downcast_ref::<String>(), None);
    /// ```
    #[must_use]
    pub fn downcast_ref<E: Throwable>(self) -> Option<&'a E> {
        Some(self.downcast()?.value())
    }

    /// Attempts to downcast the reference to a typed `ExceptionRef<E>`.
    ///
    /// Returns `None` if the captured value does not have type `E`.
    #[must_use]
    pub fn downcast<E: Throwable>(self) -> Option<ExceptionRef<'a, E>> {
        if self.is::<E>() {
            let raw = self.as_raw_ref();

            // SAFETY:
            // 1. `E` is bounded by `Sized` through `Throwable`.
            // 2. We just checked that the stored value has type `E`.
            Some(unsafe { ExceptionRef::from_raw(raw) })
        } else {
            None
        }
    }
}

// SAFETY: The underlying capture can only hold a `Send + Sync` value
// (enforced at construction), and the value is never mutated.
unsafe impl<'a, E: ?Sized> Send for ExceptionRef<'a, E> {}

// SAFETY: See the `Send` impl above.
unsafe impl<'a, E: ?Sized> Sync for ExceptionRef<'a, E> {}

impl<'a, E: ?Sized> core::fmt::Display for ExceptionRef<'a, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_raw_ref().display(f)
    }
}

impl<'a, E: ?Sized> core::fmt::Debug for ExceptionRef<'a, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_raw_ref().debug(f)
    }
}
