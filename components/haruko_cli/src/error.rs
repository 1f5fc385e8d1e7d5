//! Error types for the CLI

use core_types::CompileError;
use interpreter::RuntimeError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Source failed to compile
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Compiled program failed while running
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// File I/O error
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// REPL error
    #[error("REPL error: {0}")]
    Repl(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
