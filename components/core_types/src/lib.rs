//! Core Haruko value types and error handling.
//!
//! This crate provides the foundational types shared by every stage of the
//! Haruko toolchain: runtime value representation, the compile error
//! taxonomy, and source location tracking.
//!
//! # Overview
//!
//! - [`Value`] - Runtime representation of Haruko values
//! - [`CompileError`] - Compilation failure with position and message
//! - [`ErrorKind`] - Category of a compilation failure
//! - [`SourcePosition`] - Source code location
//!
//! # Examples
//!
//! ```
//! use core_types::{CompileError, ErrorKind, SourcePosition, Value};
//!
//! let zero = Value::Long(0);
//! assert!(zero.is_truthy());
//! assert!(!Value::Nil.is_truthy());
//!
//! let error = CompileError::new(
//!     ErrorKind::SyntaxError,
//!     "Expected ')'",
//!     SourcePosition::new(1, 7, 6),
//! );
//! assert_eq!(error.to_string(), "SyntaxError at 1:7: Expected ')'");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod value;

pub use error::{CompileError, ErrorKind};
pub use source::SourcePosition;
pub use value::Value;
