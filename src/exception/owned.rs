use core::any::TypeId;

use caught_internals::RawException;

use crate::{
    ExceptionRef,
    handlers::{self, ExceptionHandler},
    markers::{Dynamic, Throwable},
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::marker::PhantomData;

    use caught_internals::{RawException, RawExceptionRef};

    use crate::markers::Dynamic;

    /// An opaque, shareable handle to a captured exception value.
    ///
    /// [`Exception`] is the main type of this library. It owns a single
    /// captured value of some concrete type, hidden behind type erasure, and
    /// can be cloned, sent across threads, inspected, and rethrown any number
    /// of times. Every handle pointing at the same capture observes the same
    /// stored value.
    ///
    /// # Type Parameter
    ///
    /// The payload type parameter `E` defaults to [`Dynamic`], which means the
    /// concrete payload type is not statically known. A typed handle
    /// `Exception<MyError>` guarantees that the payload is a `MyError` and
    /// offers direct access through [`value`](Exception::value); a dynamic
    /// handle can be queried at runtime with [`is`](Exception::is) and
    /// [`downcast`](Exception::downcast). Converting between the two is
    /// zero-cost.
    ///
    /// # Common Usage
    ///
    /// The easiest way to create an [`Exception`] is with the
    /// [`exception!()`] macro:
    ///
    /// ```
    /// # use caught::prelude::*;
    /// let exception = exception!("file missing");
    /// println!("{exception}");
    /// ```
    ///
    /// A handle can be shared and later rethrown as a real unwinding panic
    /// that delivers the payload with its exact original type:
    ///
    /// ```should_panic
    /// # use caught::prelude::*;
    /// let exception: Exception<i32> = caught::capture(42);
    /// exception.rethrow();
    /// ```
    ///
    /// [`exception!()`]: crate::exception!
    #[repr(transparent)]
    pub struct Exception<E: ?Sized + 'static = Dynamic> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. `E` must either be a type bounded by `Sized`, or `Dynamic`.
        /// 2. If `E` is a `Sized` type: The value embedded in the handle must
        ///    be of type `E`.
        raw: RawException,
        _payload: PhantomData<E>,
    }

    impl<E: ?Sized> Exception<E> {
        /// Creates a new [`Exception`] from a [`RawException`]
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `E` must either be a type bounded by `Sized`, or `Dynamic`.
        /// 2. If `E` is a `Sized` type: The value embedded in the handle must
        ///    be of type `E`.
        #[must_use]
        pub(crate) unsafe fn from_raw(raw: RawException) -> Self {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            Self {
                raw,
                _payload: PhantomData,
            }
        }

        /// Consumes the [`Exception`] and returns the inner [`RawException`].
        #[must_use]
        pub(crate) fn into_raw(self) -> RawException {
            // SAFETY: We are destroying `self`, so we no longer
            // need to uphold any safety invariants.
            self.raw
        }

        /// Creates a lifetime-bound [`RawExceptionRef`] from the inner
        /// [`RawException`].
        #[must_use]
        pub(crate) fn as_raw_ref(&self) -> RawExceptionRef<'_> {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Upheld as the type parameter does not change.
            // 2. Trivially upheld, as no mutation occurs.
            let raw = &self.raw;

            raw.as_ref()
        }
    }
}

pub use limit_field_access::Exception;

impl<E: Throwable> Exception<E> {
    /// Creates a new [`Exception`] capturing the given error value.
    ///
    /// The value will use the [`handlers::Error`] handler for formatting.
    ///
    /// See also:
    ///
    /// - The [`exception!()`] macro will also create a new [`Exception`], but
    ///   can auto-detect the handler.
    /// - [`capture`](crate::capture) works for payloads that are not errors.
    /// - [`Exception::new_custom`] allows you to manually specify the handler.
    ///
    /// [`exception!()`]: crate::exception!
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// # #[derive(Debug, Clone)]
    /// # struct MyError;
    /// # impl core::error::Error for MyError {}
    /// # impl core::fmt::Display for MyError { fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result { write!(f, "MyError") }}
    /// let exception: Exception<MyError> = Exception::new(MyError);
    /// ```
    #[must_use]
    pub fn new(value: E) -> Self
    where
        E: core::error::Error,
    {
        Self::new_custom::<handlers::Error>(value)
    }

    /// Creates a new [`Exception`] capturing the given value with the
    /// specified handler.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception: Exception<String> =
    ///     Exception::new_custom::<handlers::Display>("not an error type".to_string());
    /// ```
    #[must_use]
    pub fn new_custom<H>(value: E) -> Self
    where
        H: ExceptionHandler<E>,
    {
        let raw = RawException::new::<E, H>(value);

        // SAFETY:
        // 1. `E` is bounded by `Sized` through `Throwable`.
        // 2. We just stored a value of type `E` in the raw handle.
        unsafe { Self::from_raw(raw) }
    }

    /// Returns a reference to the captured value.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception: Exception<i32> = caught::capture(42);
    /// assert_eq!(*exception.value(), 42);
    /// ```
    #[must_use]
    pub fn value(&self) -> &E {
        let raw = self.as_raw_ref();

        // SAFETY:
        // 1. Guaranteed by the invariants of this type.
        unsafe { raw.value_downcast_unchecked() }
    }

    /// Attempts to move the captured value out of the handle.
    ///
    /// This succeeds only when `self` is the last handle pointing at the
    /// capture. Otherwise the handle is returned unchanged, since other
    /// handles still need the value.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception: Exception<String> = caught::capture("unique".to_string());
    /// let value: String = exception.try_into_inner().unwrap();
    /// assert_eq!(value, "unique");
    ///
    /// let exception: Exception<String> = caught::capture("shared".to_string());
    /// let other = exception.clone();
    /// assert!(exception.try_into_inner().is_err());
    /// ```
    pub fn try_into_inner(self) -> Result<E, Self> {
        if self.strong_count() == 1 {
            let raw = self.into_raw();

            // SAFETY:
            // - The stored value has type `E`, guaranteed by the invariants of
            //   this type.
            // - We consumed the only handle. The strong count was observed to
            //   be 1 while we held `self` by value, and no other handle exists
            //   that could raise it again.
            Ok(unsafe { raw.into_inner_unchecked::<E>() })
        } else {
            Err(self)
        }
    }

    /// Extracts the captured value, moving it out when this is the last handle
    /// and cloning it otherwise.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception: Exception<String> = caught::capture("payload".to_string());
    /// let shared = exception.clone();
    /// assert_eq!(exception.into_inner(), "payload");
    /// assert_eq!(*shared.value(), "payload");
    /// ```
    #[must_use]
    pub fn into_inner(self) -> E {
        match self.try_into_inner() {
            Ok(value) => value,
            Err(exception) => exception.value().clone(),
        }
    }
}

impl<E: ?Sized + 'static> Exception<E> {
    /// Returns the [`TypeId`] of the captured value.
    ///
    /// For a typed handle this is always `TypeId::of::<E>()`. For a dynamic
    /// handle it identifies the concrete type the handle was created with.
    ///
    /// # Examples
    /// ```
    /// # use core::any::TypeId;
    /// # use caught::prelude::*;
    /// let exception = caught::capture(42i32).into_dynamic();
    /// assert_eq!(exception.type_id(), TypeId::of::<i32>());
    /// ```
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.as_raw_ref().type_id()
    }

    /// Returns the [`type_name`](core::any::type_name) of the captured value.
    ///
    /// This is a best-effort diagnostic aid. The returned string is not
    /// guaranteed to be stable across compiler versions and should not be used
    /// for type checks; use [`type_id`](Exception::type_id) for those.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.as_raw_ref().type_name()
    }

    /// Returns the [`TypeId`] of the handler the handle was created with.
    #[must_use]
    pub fn handler_type_id(&self) -> TypeId {
        self.as_raw_ref().handler_type_id()
    }

    /// Returns the source of the captured value, as reported by its handler.
    ///
    /// For handles created with the [`handlers::Error`] handler this delegates
    /// to the payload's own [`Error::source`](core::error::Error::source).
    #[must_use]
    pub fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.as_raw_ref().source()
    }

    /// Returns the number of handles currently sharing this capture.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception = caught::capture("shared");
    /// assert_eq!(exception.strong_count(), 1);
    /// let clone = exception.clone();
    /// assert_eq!(exception.strong_count(), 2);
    /// ```
    #[must_use]
    pub fn strong_count(&self) -> usize {
        self.as_raw_ref().strong_count()
    }

    /// Returns a borrowed [`ExceptionRef`] pointing at the same capture.
    #[must_use]
    pub fn as_ref(&self) -> ExceptionRef<'_, E> {
        let raw = self.as_raw_ref();

        // SAFETY:
        // 1. Upheld, as the type parameter does not change.
        // 2. Upheld, as the type parameter does not change.
        unsafe { ExceptionRef::from_raw(raw) }
    }

    /// Changes the payload type of the [`Exception`] to [`Dynamic`].
    ///
    /// This is a zero-cost conversion. The concrete payload is untouched and
    /// can be recovered with [`Exception::downcast`].
    ///
    /// # Examples
    /// ```
    /// # use caught::{Exception, markers::Dynamic, prelude::*};
    /// let exception: Exception<i32> = caught::capture(42);
    /// let dynamic: Exception<Dynamic> = exception.into_dynamic();
    /// assert!(dynamic.is::<i32>());
    /// ```
    #[must_use]
    pub fn into_dynamic(self) -> Exception<Dynamic> {
        let raw = self.into_raw();

        // SAFETY:
        // 1. `E = Dynamic`, so this is trivially true.
        // 2. `E = Dynamic` is not a `Sized` type, so this is trivially true.
        unsafe { Exception::from_raw(raw) }
    }

    /// Rethrows the captured value as a real unwinding panic.
    ///
    /// The payload delivered to the catch site is a fresh clone of the
    /// captured value, boxed with its exact original concrete type. A
    /// [`catch_unwind`](std::panic::catch_unwind) around the rethrow can
    /// therefore downcast the payload back to the type that was captured,
    /// even when rethrowing through an `Exception<Dynamic>`.
    ///
    /// The handle itself is untouched: it can be rethrown again, and every
    /// rethrow delivers an equivalent payload.
    ///
    /// The panic hook is not invoked, matching
    /// [`resume_unwind`](std::panic::resume_unwind): this is the
    /// continuation of a previously captured exceptional state, not a new
    /// panic.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception = caught::capture(42i32).into_dynamic();
    ///
    /// let payload = std::panic::catch_unwind(|| exception.rethrow()).unwrap_err();
    /// assert_eq!(*payload.downcast::<i32>().unwrap(), 42);
    /// ```
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    #[cold]
    pub fn rethrow(&self) -> ! {
        std::panic::resume_unwind(self.as_raw_ref().clone_boxed())
    }
}

impl Exception<Dynamic> {
    /// Returns `true` if the captured value has type `E`.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception = caught::capture(42i32).into_dynamic();
    /// assert!(exception.is::<i32>());
    /// assert!(!exception.is::<String>());
    /// ```
    #[must_use]
    pub fn is<E: Throwable>(&self) -> bool {
        self.type_id() == TypeId::of::<E>()
    }

    /// Returns a reference to the captured value if it has type `E`.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception = caught::capture(42i32).into_dynamic();
    /// assert_eq!(exception.downcast_ref::<i32>(), Some(&42));
    /// assert_eq!(exception.downcast_ref::<String>(), None);
    /// ```
    #[must_use]
    pub fn downcast_ref<E: Throwable>(&self) -> Option<&E> {
        self.as_ref().downcast_ref()
    }

    /// Attempts to convert the handle into a typed `Exception<E>`.
    ///
    /// Succeeds when the captured value has type `E`, returning the same
    /// handle with its payload type restored. Otherwise the original handle is
    /// returned unchanged. Either way this is zero-cost; no value is moved or
    /// cloned.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception = caught::capture(42i32).into_dynamic();
    ///
    /// let exception = exception.downcast::<String>().unwrap_err();
    /// let typed: Exception<i32> = exception.downcast::<i32>().unwrap();
    /// assert_eq!(*typed.value(), 42);
    /// ```
    pub fn downcast<E: Throwable>(self) -> Result<Exception<E>, Self> {
        if self.is::<E>() {
            let raw = self.into_raw();

            // SAFETY:
            // 1. `E` is bounded by `Sized` through `Throwable`.
            // 2. We just checked that the stored value has type `E`.
            Ok(unsafe { Exception::from_raw(raw) })
        } else {
            Err(self)
        }
    }

    /// Attempts to extract the captured value by value.
    ///
    /// Succeeds when the captured value has type `E`, moving it out when this
    /// is the last handle and cloning it otherwise. On a type mismatch the
    /// handle is returned unchanged.
    ///
    /// # Examples
    /// ```
    /// # use caught::prelude::*;
    /// let exception = caught::capture("payload".to_string()).into_dynamic();
    /// assert_eq!(exception.downcast_value::<String>().unwrap(), "payload");
    /// ```
    pub fn downcast_value<E: Throwable>(self) -> Result<E, Self> {
        Ok(self.downcast::<E>()?.into_inner())
    }
}

// SAFETY: An `Exception` can only be constructed from a value that is
// `Send + Sync` (enforced by the bounds on `RawException::new`), the value is
// never mutated after capture, and the reference count is atomic.
unsafe impl<E: ?Sized> Send for Exception<E> {}

// SAFETY: See the `Send` impl above.
unsafe impl<E: ?Sized> Sync for Exception<E> {}

// The captured value is behind shared, immutable access only, so observing it
// after a caught panic cannot expose a broken invariant.
impl<E: ?Sized> core::panic::UnwindSafe for Exception<E> {}
impl<E: ?Sized> core::panic::RefUnwindSafe for Exception<E> {}

impl<E: ?Sized> Clone for Exception<E> {
    /// Creates a new handle pointing at the same capture.
    ///
    /// This is a cheap reference count increment; the captured value is not
    /// cloned.
    fn clone(&self) -> Self {
        let raw = self.as_raw_ref().clone_arc();

        // SAFETY:
        // 1. Upheld, as the type parameter does not change.
        // 2. Upheld, as the clone points at the same stored value.
        unsafe { Self::from_raw(raw) }
    }
}

impl<E: ?Sized> core::fmt::Display for Exception<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_raw_ref().display(f)
    }
}

impl<E: ?Sized> core::fmt::Debug for Exception<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_raw_ref().debug(f)
    }
}

impl<E> From<E> for Exception<E>
where
    E: Throwable + core::error::Error,
{
    fn from(value: E) -> Self {
        Exception::new(value)
    }
}

impl<E: Throwable> From<Exception<E>> for Exception<Dynamic> {
    fn from(exception: Exception<E>) -> Self {
        exception.into_dynamic()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString};

    use super::*;

    #[test]
    fn typed_value_access() {
        let exception: Exception<i32> = Exception::new_custom::<handlers::Any>(7);
        assert_eq!(*exception.value(), 7);
        assert_eq!(exception.type_id(), TypeId::of::<i32>());
    }

    #[test]
    fn dynamic_round_trip() {
        let exception = Exception::new_custom::<handlers::Any>(7i32).into_dynamic();
        let typed = exception.downcast::<i32>().ok().unwrap();
        assert_eq!(*typed.value(), 7);
    }

    #[test]
    fn display_uses_handler() {
        let exception = Exception::new_custom::<handlers::Display>("broken".to_string());
        assert_eq!(format!("{exception}"), "broken");
        assert_eq!(format!("{exception:?}"), "\"broken\"");
    }
}
