//! Compiler error helpers

use crate::lexer::Token;
use core_types::{CompileError, ErrorKind, SourcePosition};

/// Create a lexical error at a given position
pub fn lexical_error(message: impl Into<String>, position: SourcePosition) -> CompileError {
    CompileError::new(ErrorKind::LexicalError, message, position)
}

/// Create a syntax error at a given position
pub fn syntax_error(message: impl Into<String>, position: SourcePosition) -> CompileError {
    CompileError::new(ErrorKind::SyntaxError, message, position)
}

/// Create an unexpected token error
pub fn unexpected_token(expected: &str, got: &Token) -> CompileError {
    syntax_error(
        format!("Expected {}, got {}", expected, got.describe()),
        got.position,
    )
}

/// Create an unexpected end of input error
pub fn unexpected_eof(position: SourcePosition) -> CompileError {
    syntax_error("Unexpected end of input", position)
}

/// Create an unresolved name error
pub fn unresolved_name(name: &str, position: SourcePosition) -> CompileError {
    CompileError::new(
        ErrorKind::UnresolvedName,
        format!("Unresolved name '{}'", name),
        position,
    )
    .with_identifier(name)
}

/// Create an error for calling something that is not a function
pub fn not_a_function(name: &str, position: SourcePosition) -> CompileError {
    CompileError::new(
        ErrorKind::UnresolvedName,
        format!("'{}' is not a function", name),
        position,
    )
    .with_identifier(name)
}

/// Create an arity mismatch error naming the callee
pub fn arity_mismatch(
    name: &str,
    expected: usize,
    got: usize,
    position: SourcePosition,
) -> CompileError {
    let plural = if expected == 1 { "" } else { "s" };
    CompileError::new(
        ErrorKind::ArityError,
        format!(
            "'{}' expects {} argument{}, got {}",
            name, expected, plural, got
        ),
        position,
    )
    .with_identifier(name)
}

/// Create a code generator invariant violation
pub fn invariant_violation(message: impl Into<String>, position: SourcePosition) -> CompileError {
    CompileError::new(ErrorKind::CompileInvariant, message, position)
}
