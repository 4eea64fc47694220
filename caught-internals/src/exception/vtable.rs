//! Vtable for type-erased exception operations.
//!
//! This module contains the [`ExceptionVtable`] which enables calling handler
//! methods on captured values when their concrete type `E` and handler type
//! `H` have been erased. The vtable stores function pointers that dispatch to
//! the correct typed implementations.
//!
//! This module encapsulates the fields of [`ExceptionVtable`] so they cannot
//! be accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameters must match the actual value type
//! and handler stored in the `ExceptionData`**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`ExceptionVtable::new`], which pairs the function pointers
//! with specific types `E` and `H` at compile time.

use alloc::boxed::Box;
use core::{
    any::{Any, TypeId},
    ptr::NonNull,
};

use crate::{
    exception::{
        data::ExceptionData,
        raw::{RawException, RawExceptionRef},
    },
    handlers::ExceptionHandler,
    util::Erased,
};

/// Vtable for type-erased exception operations.
///
/// Contains function pointers for performing operations on captured values
/// without knowing their concrete type at compile time.
///
/// # Safety
///
/// The following safety invariants are guaranteed to be upheld as long as this
/// struct exists:
///
/// * The fields `drop`, `clone_arc`, `strong_count`, `clone_boxed`, `source`,
///   `display`, and `debug` all point to the functions defined below
/// * The concrete pointers are all instantiated with the same value type `E`
///   and handler type `H` that were used to create this `ExceptionVtable`.
pub(crate) struct ExceptionVtable {
    /// Gets the [`TypeId`] of the value type that was used to create this
    /// [`ExceptionVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the value type that was used to
    /// create this [`ExceptionVtable`].
    type_name: fn() -> &'static str,
    /// Gets the [`TypeId`] of the handler that was used to create this
    /// [`ExceptionVtable`].
    handler_type_id: fn() -> TypeId,
    /// Method to drop the [`triomphe::Arc<ExceptionData<E>>`] instance pointed
    /// to by this pointer.
    drop: unsafe fn(NonNull<ExceptionData<Erased>>),
    /// Clones the `triomphe::Arc<ExceptionData<E>>` pointed to by this
    /// pointer.
    clone_arc: unsafe fn(NonNull<ExceptionData<Erased>>) -> RawException,
    /// Gets the strong count of the [`triomphe::Arc<ExceptionData<E>>`]
    /// pointed to by this pointer.
    strong_count: unsafe fn(NonNull<ExceptionData<Erased>>) -> usize,
    /// Clones the captured value into a fresh boxed payload of its exact
    /// concrete type, suitable for handing to the native unwinding machinery.
    clone_boxed: unsafe fn(RawExceptionRef<'_>) -> Box<dyn Any + Send>,
    /// Returns a reference to the source of the error using the `source`
    /// method on the handler.
    source: unsafe fn(RawExceptionRef<'_>) -> Option<&(dyn core::error::Error + 'static)>,
    /// Formats the captured value using the `display` method on the handler.
    display: unsafe fn(RawExceptionRef<'_>, &mut core::fmt::Formatter<'_>) -> core::fmt::Result,
    /// Formats the captured value using the `debug` method on the handler.
    debug: unsafe fn(RawExceptionRef<'_>, &mut core::fmt::Formatter<'_>) -> core::fmt::Result,
}

impl ExceptionVtable {
    /// Creates a new [`ExceptionVtable`] for the value type `E` and the
    /// handler type `H`.
    ///
    /// The bounds on `E` are the minimal capture constraints: `Clone` because
    /// the native raise machinery consumes an owned payload and a shared
    /// handle must be able to mint one on every rethrow, and
    /// `Send + Sync + 'static` because the resulting handle is freely
    /// shareable across threads.
    pub(super) const fn new<E, H>() -> &'static Self
    where
        E: Clone + Send + Sync + 'static,
        H: ExceptionHandler<E>,
    {
        const {
            &Self {
                type_id: TypeId::of::<E>,
                type_name: core::any::type_name::<E>,
                handler_type_id: TypeId::of::<H>,
                drop: drop::<E>,
                clone_arc: clone_arc::<E>,
                strong_count: strong_count::<E>,
                clone_boxed: clone_boxed::<E>,
                source: source::<E, H>,
                display: display::<E, H>,
                debug: debug::<E, H>,
            }
        }
    }

    /// Gets the [`TypeId`] of the value type that was used to create this
    /// [`ExceptionVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the value type that was used to
    /// create this [`ExceptionVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Gets the [`TypeId`] of the handler that was used to create this
    /// [`ExceptionVtable`].
    #[inline]
    pub(super) fn handler_type_id(&self) -> TypeId {
        (self.handler_type_id)()
    }

    /// Drops the `triomphe::Arc<ExceptionData<E>>` instance pointed to by this
    /// pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from a [`triomphe::Arc<ExceptionData<E>>`] turned
    ///    into a pointer via [`triomphe::Arc::into_raw`]
    /// 2. This [`ExceptionVtable`] must be a vtable for the value type stored
    ///    in the [`ExceptionData`].
    /// 3. The pointer is not used after calling this method. Storing the
    ///    pointer in structures that claim ownership of it, such as another
    ///    `Arc`, counts as using after calling this method.
    #[inline]
    pub(super) unsafe fn drop(&self, ptr: NonNull<ExceptionData<Erased>>) {
        // SAFETY: We know that `self.drop` points to the function `drop::<E>` below.
        // That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.drop)(ptr);
        }
    }

    /// Clones the [`triomphe::Arc<ExceptionData<E>>`] pointed to by this
    /// pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from a [`triomphe::Arc<ExceptionData<E>>`] turned
    ///    into a pointer via [`triomphe::Arc::into_raw`]
    /// 2. This [`ExceptionVtable`] must be a vtable for the value type stored
    ///    in the [`ExceptionData`].
    #[inline]
    pub(super) unsafe fn clone_arc(&self, ptr: NonNull<ExceptionData<Erased>>) -> RawException {
        // SAFETY: We know that `self.clone_arc` points to the function
        // `clone_arc::<E>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.clone_arc)(ptr) }
    }

    /// Gets the strong count of the [`triomphe::Arc<ExceptionData<E>>`]
    /// pointed to by this pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from [`triomphe::Arc<ExceptionData<E>>`] via
    ///    [`triomphe::Arc::into_raw`]
    /// 2. This [`ExceptionVtable`] must be a vtable for the value type stored
    ///    in the [`ExceptionData`].
    #[inline]
    pub(super) unsafe fn strong_count(&self, ptr: NonNull<ExceptionData<Erased>>) -> usize {
        // SAFETY: We know that `self.strong_count` points to the function
        // `strong_count::<E>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.strong_count)(ptr) }
    }

    /// Clones the captured value into a fresh boxed payload of its exact
    /// concrete type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ExceptionVtable`] must be a vtable for the value type stored
    ///    in the [`RawExceptionRef`].
    #[inline]
    pub(super) unsafe fn clone_boxed(&self, ptr: RawExceptionRef<'_>) -> Box<dyn Any + Send> {
        // SAFETY: We know that `self.clone_boxed` points to the function
        // `clone_boxed::<E>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.clone_boxed)(ptr) }
    }

    /// Returns a reference to the source of the error using the [`H::source`]
    /// function used when creating this [`ExceptionVtable`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ExceptionVtable`] must be a vtable for the value type stored
    ///    in the [`RawExceptionRef`].
    ///
    /// [`H::source`]: ExceptionHandler::source
    #[inline]
    pub(super) unsafe fn source<'a>(
        &self,
        ptr: RawExceptionRef<'a>,
    ) -> Option<&'a (dyn core::error::Error + 'static)> {
        // SAFETY: We know that `self.source` points to the function
        // `source::<E, H>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.source)(ptr) }
    }

    /// Formats the captured value using the [`H::display`] function used when
    /// creating this [`ExceptionVtable`].
    ///
    /// [`H::display`]: ExceptionHandler::display
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ExceptionVtable`] must be a vtable for the value type stored
    ///    in the [`RawExceptionRef`].
    #[inline]
    pub(super) unsafe fn display(
        &self,
        ptr: RawExceptionRef<'_>,
        formatter: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        // SAFETY: We know that `self.display` points to the function
        // `display::<E, H>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.display)(ptr, formatter) }
    }

    /// Formats the captured value using the [`H::debug`] function used when
    /// creating this [`ExceptionVtable`].
    ///
    /// [`H::debug`]: ExceptionHandler::debug
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ExceptionVtable`] must be a vtable for the value type stored
    ///    in the [`RawExceptionRef`].
    #[inline]
    pub(super) unsafe fn debug(
        &self,
        ptr: RawExceptionRef<'_>,
        formatter: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        // SAFETY: We know that `self.debug` points to the function
        // `debug::<E, H>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.debug)(ptr, formatter) }
    }
}

/// Drops the [`triomphe::Arc<ExceptionData<E>>`] instance pointed to by this
/// pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from [`triomphe::Arc<ExceptionData<E>>`] via
///    [`triomphe::Arc::into_raw`]
/// 2. The value type `E` matches the actual value type stored in the
///    [`ExceptionData`]
/// 3. The pointer is not used after calling this method. Storing the pointer
///    in structures that claim ownership of it, such as another `Arc`, counts
///    as using after calling this method.
unsafe fn drop<E: 'static>(ptr: NonNull<ExceptionData<Erased>>) {
    let ptr: NonNull<ExceptionData<E>> = ptr.cast();
    let ptr = ptr.as_ptr();
    // SAFETY:
    // 1. The pointer has the correct type and came from `Arc::into_raw`
    //    (guaranteed by caller)
    // 2. After `from_raw`, the pointer is consumed and not accessed again
    let arc = unsafe { triomphe::Arc::from_raw(ptr) };
    core::mem::drop(arc);
}

/// Clones the [`triomphe::Arc<ExceptionData<E>>`] pointed to by this pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from a [`triomphe::Arc<ExceptionData<E>>`] turned into
///    a pointer via [`triomphe::Arc::into_raw`]
/// 2. The value type `E` matches the actual value type stored in the
///    [`ExceptionData`]
unsafe fn clone_arc<E: 'static>(ptr: NonNull<ExceptionData<Erased>>) -> RawException {
    let ptr: *const ExceptionData<E> = ptr.cast::<ExceptionData<E>>().as_ptr();

    // SAFETY: The pointer is valid and came from `Arc::into_raw` with the
    // correct type (guaranteed by the caller), which fulfills the requirements
    // for `ArcBorrow::from_ptr`.
    let arc_borrow = unsafe { triomphe::ArcBorrow::from_ptr(ptr) };

    let arc = arc_borrow.clone_arc();
    RawException::from_arc(arc)
}

/// Gets the strong count of the [`triomphe::Arc<ExceptionData<E>>`] pointed to
/// by this pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from [`triomphe::Arc<ExceptionData<E>>`] via
///    [`triomphe::Arc::into_raw`]
/// 2. The value type `E` matches the actual value type stored in the
///    [`ExceptionData`]
unsafe fn strong_count<E: 'static>(ptr: NonNull<ExceptionData<Erased>>) -> usize {
    let ptr: *const ExceptionData<E> = ptr.cast::<ExceptionData<E>>().as_ptr();

    // SAFETY: The pointer is valid and came from `Arc::into_raw` with the
    // correct type (guaranteed by the caller), which fulfills the requirements
    // for `ArcBorrow::from_ptr`.
    let arc_borrow = unsafe { triomphe::ArcBorrow::from_ptr(ptr) };

    triomphe::ArcBorrow::strong_count(&arc_borrow)
}

/// Clones the captured value into a fresh boxed payload of its exact concrete
/// type.
///
/// The box erases to `dyn Any + Send`, so a caller that no longer knows `E`
/// can still hand the payload to the native unwinding machinery, and a
/// downstream catch site can downcast it back to `E`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `E` matches the actual value type stored in the
///    [`ExceptionData`]
unsafe fn clone_boxed<E: Clone + Send + 'static>(ptr: RawExceptionRef<'_>) -> Box<dyn Any + Send> {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &E = unsafe { ptr.value_downcast_unchecked::<E>() };
    Box::new(value.clone())
}

/// Gets the source error from a captured value using its handler's source
/// implementation.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `E` matches the actual value type stored in the
///    [`ExceptionData`]
unsafe fn source<'a, E: 'static, H: ExceptionHandler<E>>(
    ptr: RawExceptionRef<'a>,
) -> Option<&'a (dyn core::error::Error + 'static)> {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &E = unsafe { ptr.value_downcast_unchecked::<E>() };
    H::source(value)
}

/// Formats a captured value using its handler's display implementation.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `E` matches the actual value type stored in the
///    [`ExceptionData`]
unsafe fn display<E: 'static, H: ExceptionHandler<E>>(
    ptr: RawExceptionRef<'_>,
    formatter: &mut core::fmt::Formatter<'_>,
) -> core::fmt::Result {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &E = unsafe { ptr.value_downcast_unchecked::<E>() };
    H::display(value, formatter)
}

/// Formats a captured value using its handler's debug implementation.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `E` matches the actual value type stored in the
///    [`ExceptionData`]
unsafe fn debug<E: 'static, H: ExceptionHandler<E>>(
    ptr: RawExceptionRef<'_>,
    formatter: &mut core::fmt::Formatter<'_>,
) -> core::fmt::Result {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &E = unsafe { ptr.value_downcast_unchecked::<E>() };
    H::debug(value, formatter)
}

#[cfg(test)]
mod tests {
    use core::{error::Error, fmt};

    use super::*;
    use crate::{exception::RawException, handlers::ExceptionHandler};

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

    #[test]
    fn test_exception_vtable_eq() {
        // Vtables have static lifetime and can be safely shared
        let vtable1 = ExceptionVtable::new::<i32, HandlerI32>();
        let vtable2 = ExceptionVtable::new::<i32, HandlerI32>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
    }

    #[test]
    fn test_exception_type_id() {
        let vtable = ExceptionVtable::new::<i32, HandlerI32>();
        assert_eq!(vtable.type_id(), TypeId::of::<i32>());
        assert_eq!(vtable.handler_type_id(), TypeId::of::<HandlerI32>());
    }

    #[test]
    fn test_exception_clone_eq() {
        let exception = RawException::new::<_, HandlerI32>(42);

        let cloned_exception = exception.as_ref().clone_arc();

        // Both handles should point to the same underlying data
        assert!(core::ptr::eq(
            exception.as_ref().as_ptr(),
            cloned_exception.as_ref().as_ptr()
        ));
    }

    #[test]
    fn test_clone_boxed_payload_type() {
        let exception = RawException::new::<_, HandlerI32>(42);

        let payload = exception.as_ref().clone_boxed();
        let payload: Box<i32> = payload.downcast().expect("payload should be an i32");
        assert_eq!(*payload, 42);

        // The handle remains usable after minting a payload
        assert_eq!(exception.as_ref().type_id(), TypeId::of::<i32>());
    }
}
