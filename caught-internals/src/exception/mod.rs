//! Module containing the type-erased exception storage.

mod data;
mod raw;
mod vtable;

pub use raw::{RawException, RawExceptionRef};
