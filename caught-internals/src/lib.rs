#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`caught`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased data structures and unsafe
//! operations that power the [`caught`] exception-handle library. It provides
//! the foundation for zero-cost type erasure through vtable-based dispatch.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`caught`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`exception`]**: Type-erased exception storage
//!   - [`RawException`]: Owned exception handle with [`Arc`]-based allocation
//!   - [`RawExceptionRef`]: Borrowed reference to an exception
//!   - [`ExceptionData`]: `#[repr(C)]` wrapper enabling field access on erased
//!     types
//!   - [`ExceptionVtable`]: Function pointers for type-erased dispatch
//!
//! - **[`handlers`]**: The [`ExceptionHandler`] trait, which defines how a
//!   captured value is formatted and how its error source (if any) is reached
//!
//! # Safety Strategy
//!
//! Type erasure requires careful handling to maintain Rust's type safety
//! guarantees. When we erase a type like `ExceptionData<MyError>` to
//! `ExceptionData<Erased>`, we must ensure that the vtable function pointers
//! still match the actual concrete type stored in memory.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **`#[repr(C)]` layout**: Enables safe field projection on type-erased
//!   pointers without constructing invalid references
//! - **Documented vtable contracts**: Each vtable method specifies exactly when
//!   it can be safely called
//!
//! [`caught`]: https://docs.rs/caught/latest/caught/
//! [`ExceptionData`]: exception::data::ExceptionData
//! [`ExceptionVtable`]: exception::vtable::ExceptionVtable
//! [`ExceptionHandler`]: handlers::ExceptionHandler
//! [`Arc`]: triomphe::Arc

extern crate alloc;

mod exception;
pub mod handlers;
mod util;

pub use exception::{RawException, RawExceptionRef};
