//! Unit tests for CompileError and ErrorKind

use core_types::{CompileError, ErrorKind, SourcePosition};

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
    let error = CompileError::new(ErrorKind::SyntaxError, "boom", SourcePosition::start());
    assert_error(&error);
}

#[test]
fn test_error_carries_line_and_column() {
    let error = CompileError::new(
        ErrorKind::SyntaxError,
        "'if' expects 3 expressions, got 2",
        SourcePosition::new(1, 2, 1),
    );
    assert_eq!(error.line(), 1);
    assert_eq!(error.column(), 2);
    assert!(error.to_string().starts_with("SyntaxError at 1:2"));
}

#[test]
fn test_unresolved_name_carries_identifier() {
    let error = CompileError::new(
        ErrorKind::UnresolvedName,
        "Unresolved name 'y'",
        SourcePosition::new(3, 1, 20),
    )
    .with_identifier("y");
    assert_eq!(error.kind, ErrorKind::UnresolvedName);
    assert_eq!(error.identifier, Some("y".to_string()));
    assert_eq!(
        error.to_string(),
        "UnresolvedNameError at 3:1: Unresolved name 'y'"
    );
}

#[test]
fn test_errors_compare_by_value() {
    let a = CompileError::new(ErrorKind::LexicalError, "x", SourcePosition::start());
    let b = a.clone();
    assert_eq!(a, b);
}
