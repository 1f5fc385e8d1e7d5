//! Runtime orchestration for Haruko programs
//!
//! The Runtime drives the compiler pipeline and hands the resulting artifact
//! to the VM, the same bytes `haruko compile` would write to disk.

use crate::error::CliResult;
use bytecode_system::CompiledUnit;
use core_types::Value;
use interpreter::{ArtifactExecutor, VM};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Artifact file extension
pub const ARTIFACT_EXTENSION: &str = "hku";

/// Compiles and runs Haruko source
#[derive(Debug)]
pub struct Runtime {
    /// Whether to print the AST before compiling
    print_ast: bool,
    /// Whether to print the disassembled unit before running
    print_bytecode: bool,
    /// VM that executes compiled artifacts
    vm: VM,
}

impl Runtime {
    /// Create a runtime whose programs print to stdout
    ///
    /// # Example
    /// ```
    /// use haruko_cli::Runtime;
    ///
    /// let runtime = Runtime::new().with_print_ast(true);
    /// assert!(runtime.is_print_ast_enabled());
    /// ```
    pub fn new() -> Self {
        Self::with_vm(VM::new())
    }

    /// Create a runtime whose programs print to `output`
    pub fn with_output(output: impl Write + Send + 'static) -> Self {
        Self::with_vm(VM::with_output(output))
    }

    fn with_vm(vm: VM) -> Self {
        Self {
            print_ast: false,
            print_bytecode: false,
            vm,
        }
    }

    /// Enable bytecode printing
    pub fn with_print_bytecode(mut self, enabled: bool) -> Self {
        self.print_bytecode = enabled;
        self
    }

    /// Enable AST printing
    pub fn with_print_ast(mut self, enabled: bool) -> Self {
        self.print_ast = enabled;
        self
    }

    /// Check if bytecode printing is enabled
    pub fn is_print_bytecode_enabled(&self) -> bool {
        self.print_bytecode
    }

    /// Check if AST printing is enabled
    pub fn is_print_ast_enabled(&self) -> bool {
        self.print_ast
    }

    /// Compile source into a unit named `unit_name`
    pub fn compile_source(&self, unit_name: &str, source: &str) -> CliResult<CompiledUnit> {
        if self.print_ast {
            println!("{}", compiler::parse(source)?);
        }

        let unit = compiler::compile(unit_name, source)?;

        if self.print_bytecode {
            println!("{}", unit);
        }
        Ok(unit)
    }

    /// Compile and execute source, returning the program's value
    ///
    /// # Example
    /// ```
    /// use core_types::Value;
    /// use haruko_cli::Runtime;
    ///
    /// let mut runtime = Runtime::with_output(std::io::sink());
    /// let value = runtime.execute_source("Example", "(+ 40 2)").unwrap();
    /// assert_eq!(value, Value::Long(42));
    /// ```
    pub fn execute_source(&mut self, unit_name: &str, source: &str) -> CliResult<Value> {
        let artifact = self.compile_source(unit_name, source)?.to_bytes();
        debug!(unit = unit_name, bytes = artifact.len(), "executing artifact");
        Ok(self.vm.execute(&artifact)?)
    }

    /// Compile and execute a source file; the unit is named after the file stem
    pub fn execute_file(&mut self, path: &Path) -> CliResult<Value> {
        let source = fs::read_to_string(path)?;
        self.execute_source(&unit_name(path), &source)
    }

    /// Compile a source file and write its artifact
    ///
    /// Writes to `output`, or next to the source with the `.hku` extension.
    /// Returns the path written.
    pub fn compile_file(&self, path: &Path, output: Option<&Path>) -> CliResult<PathBuf> {
        let source = fs::read_to_string(path)?;
        let unit = self.compile_source(&unit_name(path), &source)?;

        let target = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.with_extension(ARTIFACT_EXTENSION));
        fs::write(&target, unit.to_bytes())?;
        info!(path = %target.display(), "wrote artifact");
        Ok(target)
    }

    /// Start the REPL (Read-Eval-Print Loop)
    pub fn repl(&mut self) -> CliResult<()> {
        crate::repl::run_repl(self)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit name for a source path: its file stem
pub fn unit_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Main".to_string())
}
