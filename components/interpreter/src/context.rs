//! Execution context for VM
//!
//! Holds the state that outlives a single call frame: the global table and
//! the sink `println` writes to.

use core_types::Value;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Global table and program output of one VM
pub struct ExecutionContext {
    globals: HashMap<String, Value>,
    output: Box<dyn Write + Send>,
}

impl ExecutionContext {
    /// Create a context writing program output to `output`
    pub fn new(output: Box<dyn Write + Send>) -> Self {
        Self {
            globals: HashMap::new(),
            output,
        }
    }

    /// Get a global variable by name
    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Set a global variable
    pub fn set_global(&mut self, name: String, value: Value) {
        self.globals.insert(name, value);
    }

    /// Drop every global
    pub fn clear_globals(&mut self) {
        self.globals.clear();
    }

    /// Write one line of program output
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("globals", &self.globals)
            .field("output", &"dyn Write")
            .finish()
    }
}

/// Clonable in-memory output sink
///
/// Every clone appends to the same buffer, so a caller can hand one clone to
/// a VM and read program output through another.
#[derive(Debug, Clone, Default)]
pub struct SharedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedOutput {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Output written so far, decoded lossily as UTF-8
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Discard buffered output
    pub fn clear(&self) {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
