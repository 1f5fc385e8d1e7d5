//! Bytecode interpreter for Haruko compiled units
//!
//! This crate executes the binary artifacts produced by the compiler:
//! - Artifact decoding through [`bytecode_system::CompiledUnit`]
//! - Stack-based execution with an explicit frame stack
//! - Builtin operator semantics and `println` output
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Builtin, BytecodeChunk, CompiledUnit, ConstantPool, Opcode};
//! use core_types::Value;
//! use interpreter::{ArtifactExecutor, VM};
//!
//! let mut entry = BytecodeChunk::new("<main>", 0);
//! entry.emit(Opcode::PushShort(40));
//! entry.emit(Opcode::PushShort(2));
//! entry.emit(Opcode::CallBuiltin(Builtin::Add, 2));
//! entry.emit(Opcode::Return);
//! let artifact = CompiledUnit::new("Example", ConstantPool::new(), vec![], entry).to_bytes();
//!
//! let mut vm = VM::new();
//! assert_eq!(vm.execute(&artifact).unwrap(), Value::Long(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtins;
pub mod call_frame;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use context::{ExecutionContext, SharedOutput};
pub use dispatch::Dispatcher;
pub use error::RuntimeError;
pub use vm::{ArtifactExecutor, DEFAULT_MAX_CALL_DEPTH, VM};
