//! Contract compliance tests for bytecode_system
//! Verifies the artifact layout that external loaders rely on

use bytecode_system::{BytecodeChunk, CompiledUnit, ConstantPool, Opcode};

fn empty_program() -> CompiledUnit {
    let mut entry = BytecodeChunk::new("main", 0);
    entry.emit(Opcode::PushNil);
    entry.emit(Opcode::Return);
    entry.max_stack = 1;
    CompiledUnit::new("Empty", ConstantPool::new(), vec![], entry)
}

/// Header: magic, version, length-prefixed unit name
#[test]
fn test_contract_header_layout() {
    let bytes = empty_program().to_bytes();
    assert_eq!(&bytes[0..4], b"HRKU");
    assert_eq!(bytes[4], 1);
    assert_eq!(&bytes[5..9], &5u32.to_le_bytes());
    assert_eq!(&bytes[9..14], b"Empty");
    // Empty constant pool, no methods
    assert_eq!(&bytes[14..18], &0u32.to_le_bytes());
    assert_eq!(&bytes[18..22], &0u32.to_le_bytes());
}

/// Entry method: name, arity, max_locals, max_stack, instruction count
#[test]
fn test_contract_entry_layout() {
    let bytes = empty_program().to_bytes();
    let entry = &bytes[22..];
    assert_eq!(&entry[0..4], &4u32.to_le_bytes());
    assert_eq!(&entry[4..8], b"main");
    assert_eq!(entry[8], 0); // arity
    assert_eq!(&entry[9..11], &0u16.to_le_bytes()); // max_locals
    assert_eq!(&entry[11..13], &1u16.to_le_bytes()); // max_stack
    assert_eq!(&entry[13..17], &2u32.to_le_bytes()); // instruction count
    // PushNil, no position; Return, no position
    assert_eq!(&entry[17..], &[0, 0, 14, 0]);
}

/// Entry point takes no arguments
#[test]
fn test_contract_entry_has_no_parameters() {
    let unit = empty_program();
    assert_eq!(unit.entry.arity, 0);
}
