//! Haruko CLI Library
//!
//! Provides the Runtime struct and supporting modules for the `haruko` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::{Cli, Command};
pub use error::{CliError, CliResult};
pub use repl::Session;
pub use runtime::Runtime;
