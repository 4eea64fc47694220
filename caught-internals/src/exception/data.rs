//! This module encapsulates the fields of the [`ExceptionData`]. Since this is
//! the only place they are visible, this means that the type of the
//! [`ExceptionVtable`] is guaranteed to always be in sync with the type of the
//! actual captured value. This follows from the fact that they are in sync
//! when created and that the API offers no way to change the
//! [`ExceptionVtable`] or value type after creation.

use core::ptr::NonNull;

use crate::{
    exception::{
        raw::{RawException, RawExceptionRef},
        vtable::ExceptionVtable,
    },
    handlers::ExceptionHandler,
    util::Erased,
};

/// Type-erased exception data structure with vtable-based dispatch.
///
/// This struct uses `#[repr(C)]` to enable safe field access in type-erased
/// contexts, allowing access to the vtable even when the concrete value type
/// `E` is unknown.
#[repr(C)]
pub(super) struct ExceptionData<E: 'static> {
    /// Reference to the vtable of this exception
    vtable: &'static ExceptionVtable,
    /// The captured value of this exception
    value: E,
}

impl<E: 'static> ExceptionData<E> {
    /// Creates a new [`ExceptionData`] with the specified handler and value.
    ///
    /// This method creates the vtable for type-erased dispatch and pairs it
    /// with the captured value.
    pub(super) fn new<H>(value: E) -> Self
    where
        E: Clone + Send + Sync,
        H: ExceptionHandler<E>,
    {
        Self {
            vtable: ExceptionVtable::new::<E, H>(),
            value,
        }
    }
}

impl RawException {
    /// Consumes the handle and returns the captured value.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// - The type `E` matches the actual value type stored in the
    ///   [`ExceptionData`].
    /// - This is the only existing reference pointing to the inner
    ///   [`ExceptionData`]. Specifically the strong count of the inner
    ///   [`triomphe::Arc`] must be `1`.
    pub unsafe fn into_inner_unchecked<E: 'static>(self) -> E {
        let ptr: NonNull<ExceptionData<Erased>> = self.into_non_null();
        let ptr: NonNull<ExceptionData<E>> = ptr.cast::<ExceptionData<E>>();
        let ptr: *const ExceptionData<E> = ptr.as_ptr();

        // SAFETY: The requirements of `Arc::from_raw`:
        // - The given pointer must be a valid pointer to `T` that came from
        //   `Arc::into_raw`.
        // - After `from_raw`, the pointer must not be accessed.
        //
        // Both of these are guaranteed by our caller.
        let arc: triomphe::Arc<ExceptionData<E>> = unsafe { triomphe::Arc::from_raw(ptr) };

        match triomphe::Arc::try_unique(arc) {
            Ok(unique) => triomphe::UniqueArc::into_inner(unique).value,
            Err(_) => {
                if cfg!(debug_assertions) {
                    unreachable!("Caller did not fulfill the guarantee that pointer is unique")
                } else {
                    // SAFETY: This unsafe block *will* cause Undefined Behavior.
                    // However our caller guarantees that the pointer must be
                    // unique. This match arm can only be reached when our caller
                    // has broken that requirement, so it is valid to cause
                    // Undefined Behavior in this case.
                    unsafe { core::hint::unreachable_unchecked() }
                }
            }
        }
    }
}

impl<'a> RawExceptionRef<'a> {
    /// Returns a reference to the [`ExceptionVtable`] of the [`ExceptionData`]
    /// instance.
    pub(super) fn vtable(self) -> &'static ExceptionVtable {
        let ptr = self.as_ptr();
        // SAFETY: We don't know the actual inner value type, but we do know
        // that the pointer points to an instance of `ExceptionData<E>` for some
        // specific `E`. Since `ExceptionData<E>` is `#[repr(C)]`, that means we
        // can access the fields before the actual value.
        //
        // We need to take care to avoid creating an actual reference to the
        // `ExceptionData` itself though, as that would still be undefined
        // behavior since we don't have the right type.
        let vtable_ptr: *const &'static ExceptionVtable = unsafe { &raw const (*ptr).vtable };

        // SAFETY: Dereferencing the pointer and getting out the
        // `&'static ExceptionVtable` is valid for the same reasons
        unsafe { *vtable_ptr }
    }

    /// Accesses the captured value of the [`ExceptionData`] instance as a
    /// reference to the specified type.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the type `E` matches the actual value type
    /// stored in the [`ExceptionData`].
    pub unsafe fn value_downcast_unchecked<E: 'static>(self) -> &'a E {
        // SAFETY: The inner function requires that `E` matches the type stored,
        // but that is guaranteed by our caller.
        let this = unsafe { self.cast_inner::<E>() };
        &this.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_data_field_offsets() {
        // Fields must be accessible in the expected order for type-erased
        // access
        use core::mem::{offset_of, size_of};

        fn check<T: 'static>() {
            assert_eq!(offset_of!(ExceptionData<T>, vtable), 0);
            assert!(offset_of!(ExceptionData<T>, value) >= size_of::<&'static ExceptionVtable>());
        }

        #[repr(align(32))]
        struct LargeAlignment {
            _value: u8,
        }

        check::<u8>();
        check::<i32>();
        check::<[u64; 4]>();
        check::<LargeAlignment>();
    }
}
