//! Integration test suite for Haruko
//!
//! This crate provides integration tests that verify components work
//! together across component boundaries: source text through the compiler,
//! the binary artifact, and execution in the VM.

use core_types::Value;
use interpreter::{ArtifactExecutor, RuntimeError, SharedOutput, VM};

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use compiler;
    pub use core_types;
    pub use haruko_cli;
    pub use interpreter;
}

/// Why a pipeline run failed
#[derive(Debug)]
pub enum PipelineError {
    /// Rejected by the compiler
    Compile(core_types::CompileError),
    /// Failed while executing
    Runtime(RuntimeError),
}

/// Compile `source`, serialize it, and execute the artifact
///
/// Returns the program's value and everything it printed.
pub fn run_source(source: &str) -> Result<(Value, String), PipelineError> {
    let unit = compiler::compile("Test", source).map_err(PipelineError::Compile)?;
    let output = SharedOutput::new();
    let mut vm = VM::with_output(output.clone());
    let value = vm
        .execute(&unit.to_bytes())
        .map_err(PipelineError::Runtime)?;
    Ok((value, output.contents()))
}

/// Value of `source`, panicking on any failure
pub fn eval(source: &str) -> Value {
    match run_source(source) {
        Ok((value, _)) => value,
        Err(e) => panic!("{:?} failed: {:?}", source, e),
    }
}
