//! Virtual Machine for bytecode execution
//!
//! Main entry point for executing compiled Haruko units.

use bytecode_system::CompiledUnit;
use core_types::Value;
use std::io::{self, Write};
use tracing::{debug, info_span};

use crate::context::ExecutionContext;
use crate::dispatch::Dispatcher;
use crate::error::RuntimeError;

/// Default limit on nested method invocations
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Something that can execute a serialized compiled unit
pub trait ArtifactExecutor {
    /// Decode `artifact` and run its entry method, returning the program's value
    fn execute(&mut self, artifact: &[u8]) -> Result<Value, RuntimeError>;
}

/// Virtual Machine for executing compiled units
///
/// The VM owns the global table and the output sink `println` writes to.
/// Globals are cleared at the start of every run.
#[derive(Debug)]
pub struct VM {
    context: ExecutionContext,
    max_call_depth: usize,
}

impl VM {
    /// Create a VM writing program output to stdout
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// Create a VM writing program output to `output`
    pub fn with_output(output: impl Write + Send + 'static) -> Self {
        Self {
            context: ExecutionContext::new(Box::new(output)),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Set the call depth limit
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth.max(1);
        self
    }

    /// Decode an artifact into a unit
    pub fn load(bytes: &[u8]) -> Result<CompiledUnit, RuntimeError> {
        Ok(CompiledUnit::from_bytes(bytes)?)
    }

    /// Execute a unit's entry method and return its value
    ///
    /// # Example
    ///
    /// ```
    /// use bytecode_system::{BytecodeChunk, CompiledUnit, ConstantPool, Opcode};
    /// use core_types::Value;
    /// use interpreter::VM;
    ///
    /// let mut entry = BytecodeChunk::new("<main>", 0);
    /// entry.emit(Opcode::PushShort(42));
    /// entry.emit(Opcode::Return);
    /// let unit = CompiledUnit::new("Doc", ConstantPool::new(), vec![], entry);
    ///
    /// let mut vm = VM::new();
    /// assert_eq!(vm.run(&unit).unwrap(), Value::Long(42));
    /// ```
    pub fn run(&mut self, unit: &CompiledUnit) -> Result<Value, RuntimeError> {
        let span = info_span!("vm.run", unit = %unit.name);
        let _enter = span.enter();

        self.context.clear_globals();
        let result = Dispatcher::new(unit, self.max_call_depth).run(&mut self.context);
        match &result {
            Ok(value) => debug!(value = %value.repr(), "run finished"),
            Err(e) => debug!(error = %e, "run failed"),
        }
        result
    }

    /// Get a global variable left by the last run
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.context.get_global(name).cloned()
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactExecutor for VM {
    fn execute(&mut self, artifact: &[u8]) -> Result<Value, RuntimeError> {
        let unit = Self::load(artifact)?;
        self.run(&unit)
    }
}
