//! Runtime errors raised while loading or executing an artifact

use bytecode_system::DecodeError;
use core_types::SourcePosition;
use thiserror::Error;

/// Errors raised by the artifact executor
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The artifact could not be decoded
    #[error("failed to load artifact: {0}")]
    Load(#[from] DecodeError),

    /// An operator was applied to values of the wrong kind
    #[error("type error{}: {message}", at(.position))]
    Type {
        /// Description of the mismatch
        message: String,
        /// Source position of the failing instruction
        position: Option<SourcePosition>,
    },

    /// Integer division by zero
    #[error("division by zero{}", at(.position))]
    DivisionByZero {
        /// Source position of the failing instruction
        position: Option<SourcePosition>,
    },

    /// A global was read before any `def` assigned it
    #[error("undefined global '{0}'")]
    UndefinedGlobal(String),

    /// The call depth limit was exceeded
    #[error("stack overflow: call depth exceeded {0}")]
    StackOverflow(usize),

    /// The bytecode violates an invariant the compiler guarantees
    #[error("corrupt bytecode: {0}")]
    Corrupt(String),

    /// Writing program output failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

fn at(position: &Option<SourcePosition>) -> String {
    match position {
        Some(pos) => format!(" at {}", pos),
        None => String::new(),
    }
}

impl RuntimeError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        RuntimeError::Corrupt(message.into())
    }

    /// Attach a source position to errors that carry one
    pub(crate) fn at_position(self, source_position: Option<SourcePosition>) -> Self {
        match self {
            RuntimeError::Type { message, position } => RuntimeError::Type {
                message,
                position: position.or(source_position),
            },
            RuntimeError::DivisionByZero { position } => RuntimeError::DivisionByZero {
                position: position.or(source_position),
            },
            other => other,
        }
    }
}
