//! Bytecode system for the Haruko toolchain
//!
//! This crate provides the stack-machine instruction set, per-method bytecode
//! chunks, the unit-wide constant pool, and the binary artifact format that
//! the compiler emits and the executor loads.
//!
//! # Features
//!
//! - Stack-based bytecode with a fixed stack effect per opcode
//! - Deduplicating constant pool
//! - Binary serialization with validation on load
//! - Disassembly listing via `Display`
//!
//! # Example
//!
//! ```
//! use bytecode_system::{BytecodeChunk, CompiledUnit, Constant, ConstantPool, Opcode};
//!
//! let mut constants = ConstantPool::new();
//! let idx = constants.add(Constant::Str("hello".to_string())).unwrap();
//!
//! let mut entry = BytecodeChunk::new("main", 0);
//! entry.emit(Opcode::LoadConst(idx));
//! entry.emit(Opcode::Return);
//! entry.max_stack = 1;
//!
//! let unit = CompiledUnit::new("Hello", constants, vec![], entry);
//!
//! // Serialize
//! let bytes = unit.to_bytes();
//! let restored = CompiledUnit::from_bytes(&bytes).unwrap();
//! assert_eq!(unit, restored);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
mod codec;
pub mod constant;
pub mod instruction;
pub mod opcode;
pub mod unit;

// Re-export main types at crate root
pub use chunk::BytecodeChunk;
pub use codec::DecodeError;
pub use constant::{Constant, ConstantPool};
pub use instruction::Instruction;
pub use opcode::{Builtin, LocalSlot, Opcode};
pub use unit::CompiledUnit;
