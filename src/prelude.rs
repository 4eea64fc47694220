//! Commonly used items for convenient importing.
//!
//! The prelude module re-exports the most frequently used types, traits, and
//! macros from the caught library. This allows you to import everything you
//! need with a single use statement.
//!
//! # Usage
//!
//! ```rust
//! use caught::prelude::*;
//!
//! fn divide(a: i32, b: i32) -> Result<i32, Exception> {
//!     if b == 0 {
//!         return Err(exception!("cannot divide by zero"));
//!     }
//!     Ok(a / b)
//! }
//!
//! let result = divide(10, 2);
//! assert_eq!(result.unwrap(), 5);
//! ```
//!
//! # What's Included
//!
//! This prelude includes:
//!
//! - **[`Exception`]** and **[`ExceptionRef`]**: The exception handle types
//! - **[`capture`]**: The universal capture function
//! - **[`exception!`]** and **[`throw!`]**: Macros for creating and raising
//!   exceptions
//! - **[`handlers`]**: Built-in formatting handlers
//! - **[`markers`]**: The [`Dynamic`](markers::Dynamic) marker and the
//!   [`Throwable`](markers::Throwable) trait

#[cfg(feature = "std")]
pub use crate::throw;
pub use crate::{Exception, ExceptionRef, capture, exception, handlers, markers};
