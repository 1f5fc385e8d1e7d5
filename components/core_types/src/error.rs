//! Compilation error types.
//!
//! Every stage of the pipeline fails with a single [`CompileError`] that
//! carries the category of the failure, a human readable message, and the
//! position of the offending token.

use crate::SourcePosition;
use std::fmt;

/// The category of a compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed token (unterminated string, bad escape, integer overflow)
    LexicalError,
    /// Malformed form, unmatched delimiter, wrong `if`/`cond` shape
    SyntaxError,
    /// Identifier with no reachable binding
    UnresolvedName,
    /// Call-site argument count differs from the callee's parameter count
    ArityError,
    /// Internal code generator inconsistency (stack depth, slot allocation)
    CompileInvariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::LexicalError => "LexicalError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::UnresolvedName => "UnresolvedNameError",
            ErrorKind::ArityError => "ArityError",
            ErrorKind::CompileInvariant => "CompileInvariantError",
        };
        f.write_str(name)
    }
}

/// A compilation error with message and source position.
///
/// # Examples
///
/// ```
/// use core_types::{CompileError, ErrorKind, SourcePosition};
///
/// let error = CompileError::new(
///     ErrorKind::UnresolvedName,
///     "Unresolved name 'x'",
///     SourcePosition::new(2, 4, 12),
/// )
/// .with_identifier("x");
///
/// assert_eq!(error.identifier.as_deref(), Some("x"));
/// assert_eq!(error.line(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at {position}: {message}")]
pub struct CompileError {
    /// The category of the error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Position of the offending token
    pub position: SourcePosition,
    /// The unresolved or miscalled identifier, if any
    pub identifier: Option<String>,
}

impl CompileError {
    /// Create a new error without an identifier
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
            identifier: None,
        }
    }

    /// Attach the identifier the error is about
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Line of the offending token (1-based)
    pub fn line(&self) -> u32 {
        self.position.line
    }

    /// Column of the offending token (1-based)
    pub fn column(&self) -> u32 {
        self.position.column
    }
}
