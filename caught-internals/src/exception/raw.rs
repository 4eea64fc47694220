//! Type-erased exception pointer types.
//!
//! This module encapsulates the `ptr` field of [`RawException`] and
//! [`RawExceptionRef`], ensuring it is only visible within this module. This
//! visibility restriction guarantees the safety invariant: **the pointer
//! always comes from `Arc<ExceptionData<E>>`**.
//!
//! # Safety Invariant
//!
//! Since the `ptr` field can only be set via [`RawException::new`] or
//! [`RawException::from_arc`] (which create it from `Arc::into_raw`), and
//! cannot be modified afterward (no `pub` or `pub(crate)` fields), the pointer
//! provenance remains valid throughout the value's lifetime.
//!
//! The [`RawException::drop`] implementation and reference counting operations
//! rely on this invariant to safely reconstruct the `Arc` and manage memory.
//!
//! # Type Erasure
//!
//! The concrete type parameter `E` is erased by casting to
//! `ExceptionData<Erased>`. The vtable stored within the `ExceptionData`
//! provides the runtime type information needed to safely downcast, format,
//! and clone the captured value.
//!
//! # Allocation Strategy
//!
//! Exceptions use `triomphe::Arc` for storage. This enables:
//! - Cheap cloning through reference counting
//! - Shared ownership across multiple handles
//! - Thread-safe sharing, since captured values are required to be
//!   `Send + Sync` at construction time

use alloc::boxed::Box;
use core::{
    any::{Any, TypeId},
    ptr::NonNull,
};

use crate::{exception::data::ExceptionData, handlers::ExceptionHandler, util::Erased};

/// A pointer to an [`ExceptionData`] that is guaranteed to point to an
/// initialized instance of an [`ExceptionData<E>`] for some specific `E`,
/// though we do not know which actual `E` it is.
///
/// However, the pointer is allowed to transition into a non-initialized state
/// inside the [`RawException::drop`] method.
///
/// The pointer is guaranteed to have been created using
/// [`triomphe::Arc::into_raw`].
///
/// We cannot use a [`triomphe::OffsetArc<ExceptionData<E>>`] directly, because
/// that does not allow us to type-erase the `E`.
#[repr(transparent)]
pub struct RawException {
    /// Pointer to the inner exception data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a
    ///    `triomphe::Arc<ExceptionData<E>>` for some `E` using
    ///    `triomphe::Arc::into_raw`.
    /// 2. The pointer retains full provenance over the `Arc` for the entire
    ///    lifetime of this object (i.e., it was not derived from a `&T`)
    /// 3. The pointer will point to the same `ExceptionData<E>` for the entire
    ///    lifetime of this object.
    ptr: NonNull<ExceptionData<Erased>>,
}

impl RawException {
    /// Creates a new [`RawException`] from a
    /// [`triomphe::Arc<ExceptionData<E>>`].
    #[inline]
    pub(super) fn from_arc<E: 'static>(data: triomphe::Arc<ExceptionData<E>>) -> Self {
        let ptr: *const ExceptionData<E> = triomphe::Arc::into_raw(data);
        let ptr: *mut ExceptionData<Erased> = ptr.cast::<ExceptionData<Erased>>().cast_mut();

        // SAFETY:
        // 1. Triomphe guarantees that `Arc::into_raw` returns a non-null pointer.
        let ptr: NonNull<ExceptionData<Erased>> = unsafe { NonNull::new_unchecked(ptr) };

        Self {
            // SAFETY:
            // 1. We just created the pointer using `triomphe::Arc::into_raw`.
            // 2. We have provenance and we are not locally changing that here
            // 3. We are creating the object here and we are not changing the pointer.
            ptr,
        }
    }

    /// Consumes the [`RawException`] without decrementing the reference count
    /// and returns the inner pointer.
    #[inline]
    pub(super) fn into_non_null(self) -> NonNull<ExceptionData<Erased>> {
        let ptr = self.ptr;
        core::mem::forget(self);
        ptr
    }

    /// Creates a new [`RawException`] capturing the supplied value with the
    /// specified handler.
    ///
    /// The created exception will have the supplied value type and handler
    /// type. It will also have a strong count of 1.
    #[inline]
    pub fn new<E, H>(value: E) -> Self
    where
        E: Clone + Send + Sync + 'static,
        H: ExceptionHandler<E>,
    {
        let data = triomphe::Arc::new(ExceptionData::new::<H>(value));
        Self::from_arc(data)
    }

    /// Returns a reference to the [`ExceptionData`] instance.
    #[inline]
    pub fn as_ref(&self) -> RawExceptionRef<'_> {
        RawExceptionRef {
            // SAFETY:
            // 1. Guaranteed by the invariants on `RawException`
            // 2. Guaranteed by the invariants on `RawException` and the fact
            //    that captured values are never mutated after construction
            // 3. We are creating the `RawExceptionRef` here, and we are
            //    not changing the pointer
            ptr: self.ptr,
            _marker: core::marker::PhantomData,
        }
    }
}

impl Drop for RawException {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.as_ref().vtable();

        // SAFETY:
        // 1. The pointer comes from `Arc::into_raw` (guaranteed by `RawException::new`)
        // 2. The vtable returned by `self.as_ref().vtable()` is guaranteed to match
        //    the data in the `ExceptionData`.
        // 3. The pointer is not used after this call (we're in the drop function)
        unsafe {
            vtable.drop(self.ptr);
        }
    }
}

/// A lifetime-bound pointer to an [`ExceptionData`] that is guaranteed to
/// point to an initialized instance of an [`ExceptionData<E>`] for some
/// specific `E`, though we do not know which actual `E` it is.
///
/// We cannot use a [`&'a ExceptionData<E>`] directly, because that would
/// require us to know the actual type of the captured value, which we do not.
///
/// [`&'a ExceptionData<E>`]: ExceptionData
///
/// # Safety invariants
///
/// This reference behaves like a `&'a ExceptionData<E>` for some unknown `E`
/// and upholds the usual safety invariants of shared references:
///
/// 1. The pointee is properly initialized for the entire lifetime `'a`.
/// 2. The pointee is not mutated for the entire lifetime `'a`.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct RawExceptionRef<'a> {
    /// Pointer to the inner exception data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a
    ///    `triomphe::Arc<ExceptionData<E>>` for some `E` using
    ///    `triomphe::Arc::into_raw`.
    /// 2. The pointer retains full provenance over the `Arc` for the entire
    ///    lifetime of this object (i.e., it was not derived from a `&T`)
    /// 3. The pointer will point to the same `ExceptionData<E>` for the entire
    ///    lifetime of this object.
    ptr: NonNull<ExceptionData<Erased>>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a ExceptionData<Erased>`
    _marker: core::marker::PhantomData<&'a ExceptionData<Erased>>,
}

impl<'a> RawExceptionRef<'a> {
    /// Casts the [`RawExceptionRef`] to an [`ExceptionData<E>`] reference.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `E` matches the actual value type stored in the
    ///    [`ExceptionData`]
    #[inline]
    pub(super) unsafe fn cast_inner<E: 'static>(self) -> &'a ExceptionData<E> {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.vtable().type_id(), TypeId::of::<E>());

        let this = self.ptr.cast::<ExceptionData<E>>();
        // SAFETY: Converting the NonNull pointer to a reference is sound because:
        // - The pointer is non-null, properly aligned, and dereferenceable
        //   (guaranteed by RawExceptionRef's type invariants)
        // - The pointee is properly initialized (RawExceptionRef's doc comment
        //   guarantees it points to an initialized ExceptionData<E> for some E)
        // - The type `E` matches the actual value type (guaranteed by caller)
        // - Shared access is allowed
        // - The reference lifetime 'a is valid (tied to RawExceptionRef<'a>'s
        //   lifetime)
        unsafe { this.as_ref() }
    }

    /// Returns a raw pointer to the [`ExceptionData`] instance.
    #[inline]
    pub(super) fn as_ptr(self) -> *const ExceptionData<Erased> {
        self.ptr.as_ptr()
    }

    /// Returns the [`TypeId`] of the captured value.
    #[inline]
    pub fn type_id(self) -> TypeId {
        self.vtable().type_id()
    }

    /// Returns the [`core::any::type_name`] of the captured value.
    #[inline]
    pub fn type_name(self) -> &'static str {
        self.vtable().type_name()
    }

    /// Returns the [`TypeId`] of the handler.
    #[inline]
    pub fn handler_type_id(self) -> TypeId {
        self.vtable().handler_type_id()
    }

    /// Returns the source of the captured value using the
    /// [`ExceptionHandler::source`] method specified when the
    /// [`ExceptionData`] was created.
    #[inline]
    pub fn source(self) -> Option<&'a (dyn core::error::Error + 'static)> {
        let vtable = self.vtable();
        // SAFETY:
        // 1. The vtable returned by `self.vtable()` is guaranteed to match the
        //    data in the `ExceptionData`.
        unsafe { vtable.source(self) }
    }

    /// Formats the captured value by using the [`ExceptionHandler::display`]
    /// method specified by the handler used to create the [`ExceptionData`].
    #[inline]
    pub fn display(self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let vtable = self.vtable();
        // SAFETY:
        // 1. The vtable returned by `self.vtable()` is guaranteed to match the
        //    data in the `ExceptionData`.
        unsafe { vtable.display(self, formatter) }
    }

    /// Formats the captured value by using the [`ExceptionHandler::debug`]
    /// method specified by the handler used to create the [`ExceptionData`].
    #[inline]
    pub fn debug(self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let vtable = self.vtable();
        // SAFETY:
        // 1. The vtable returned by `self.vtable()` is guaranteed to match the
        //    data in the `ExceptionData`.
        unsafe { vtable.debug(self, formatter) }
    }

    /// Clones the captured value into a fresh boxed payload of its exact
    /// concrete type.
    ///
    /// The payload is suitable for handing to the native unwinding machinery:
    /// a catch site that downcasts it will observe the original value type.
    #[inline]
    pub fn clone_boxed(self) -> Box<dyn Any + Send> {
        let vtable = self.vtable();
        // SAFETY:
        // 1. The vtable returned by `self.vtable()` is guaranteed to match the
        //    data in the `ExceptionData`.
        unsafe { vtable.clone_boxed(self) }
    }

    /// Clones the inner [`triomphe::Arc`] and returns a new [`RawException`]
    /// pointing to the same data.
    ///
    /// Every handle is compatible with shared ownership (captured values are
    /// immutable after construction), so this is safe to call at any time.
    #[inline]
    pub fn clone_arc(self) -> RawException {
        let vtable = self.vtable();
        // SAFETY:
        // 1. Guaranteed by invariants on this type
        // 2. The vtable returned by `self.vtable()` is guaranteed to match the
        //    data in the `ExceptionData`.
        unsafe { vtable.clone_arc(self.ptr) }
    }

    /// Gets the strong count of the inner [`triomphe::Arc`].
    #[inline]
    pub fn strong_count(self) -> usize {
        let vtable = self.vtable();
        // SAFETY:
        // 1. Guaranteed by invariants on this type
        // 2. The vtable returned by `self.vtable()` is guaranteed to match the
        //    data in the `ExceptionData`.
        unsafe { vtable.strong_count(self.ptr) }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::{error::Error, fmt};

    use super::*;
    use crate::handlers::ExceptionHandler;

    struct HandlerI32;
    impl ExceptionHandler<i32> for HandlerI32 {
        fn source(_value: &i32) -> Option<&(dyn Error + 'static)> {
            None
        }

        fn display(value: &i32, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Display::fmt(value, formatter)
        }

        fn debug(value: &i32, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(value, formatter)
        }
    }

    struct HandlerString;
    impl ExceptionHandler<String> for HandlerString {
        fn source(_value: &String) -> Option<&(dyn Error + 'static)> {
            None
        }

        fn display(value: &String, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Display::fmt(value, formatter)
        }

        fn debug(value: &String, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(value, formatter)
        }
    }

    #[test]
    fn test_raw_exception_size() {
        assert_eq!(
            core::mem::size_of::<RawException>(),
            core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<Option<RawException>>(),
            core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<Result<(), RawException>>(),
            core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<Result<String, RawException>>(),
            core::mem::size_of::<String>()
        );

        assert_eq!(
            core::mem::size_of::<RawExceptionRef<'_>>(),
            core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<Option<RawExceptionRef<'_>>>(),
            core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_raw_exception_get_refs() {
        let exception = RawException::new::<i32, HandlerI32>(789);
        let exception_ref = exception.as_ref();

        // Accessing the pointer multiple times should be safe and consistent
        let ptr1 = exception_ref.as_ptr();
        let ptr2 = exception_ref.as_ptr();
        assert_eq!(ptr1, ptr2);
    }

    #[test]
    fn test_raw_exception_clone_arc() {
        let exception = RawException::new::<i32, HandlerI32>(123);
        let exception_ref = exception.as_ref();

        assert_eq!(exception_ref.strong_count(), 1);
        assert_eq!(exception_ref.type_id(), TypeId::of::<i32>());

        let cloned = exception_ref.clone_arc();
        let cloned_ref = cloned.as_ref();

        assert_eq!(exception_ref.strong_count(), 2);
        assert_eq!(cloned_ref.strong_count(), 2);

        // Both should have same type and vtable
        assert_eq!(exception_ref.type_id(), cloned_ref.type_id());
        assert!(core::ptr::eq(exception_ref.vtable(), cloned_ref.vtable()));

        core::mem::drop(cloned);

        // After dropping the strong count should go back down
        assert_eq!(exception_ref.strong_count(), 1);
    }

    #[test]
    fn test_raw_exception_downcast() {
        let int_exception = RawException::new::<i32, HandlerI32>(42);
        let string_exception = RawException::new::<String, HandlerString>(String::from("test"));

        let int_ref = int_exception.as_ref();
        let string_ref = string_exception.as_ref();

        assert_eq!(int_ref.type_id(), TypeId::of::<i32>());
        assert_eq!(string_ref.type_id(), TypeId::of::<String>());

        // The vtables should be different
        assert!(!core::ptr::eq(int_ref.vtable(), string_ref.vtable()));

        // Correct downcasting should work
        assert_eq!(unsafe { int_ref.value_downcast_unchecked::<i32>() }, &42);
        assert_eq!(
            unsafe { string_ref.value_downcast_unchecked::<String>() },
            "test"
        );
    }

    #[test]
    fn test_raw_exception_into_inner() {
        let exception = RawException::new::<String, HandlerString>(String::from("moved out"));

        assert_eq!(exception.as_ref().strong_count(), 1);

        // SAFETY: The type matches and the strong count is 1
        let value = unsafe { exception.into_inner_unchecked::<String>() };
        assert_eq!(value, "moved out");
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(RawException: Send, Sync);
        static_assertions::assert_not_impl_any!(RawExceptionRef<'_>: Send, Sync);
    }
}
