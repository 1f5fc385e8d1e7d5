//! BytecodeChunk and CompiledUnit serialization tests

use bytecode_system::{
    Builtin, BytecodeChunk, CompiledUnit, Constant, ConstantPool, DecodeError, LocalSlot, Opcode,
};
use core_types::SourcePosition;

fn unit_with(methods: Vec<BytecodeChunk>, entry: BytecodeChunk) -> CompiledUnit {
    let mut constants = ConstantPool::new();
    constants.add(Constant::Double(2.5)).unwrap();
    constants.add(Constant::Str("greeting".to_string())).unwrap();
    CompiledUnit::new("Test1", constants, methods, entry)
}

#[test]
fn test_every_opcode_survives_serialization() {
    let mut entry = BytecodeChunk::new("main", 0);
    let opcodes = [
        Opcode::PushNil,
        Opcode::PushTrue,
        Opcode::PushFalse,
        Opcode::PushShort(i16::MIN),
        Opcode::LoadConst(1),
        Opcode::LoadLocal(LocalSlot(2)),
        Opcode::StoreLocal(LocalSlot(2)),
        Opcode::LoadGlobal(1),
        Opcode::StoreGlobal(1),
        Opcode::LoadFunction(0),
        Opcode::Dup,
        Opcode::Pop,
        Opcode::Jump(14),
        Opcode::JumpIfFalse(0),
        Opcode::Invoke(0, 2),
        Opcode::CallBuiltin(Builtin::Println, 1),
        Opcode::Return,
    ];
    for (i, opcode) in opcodes.iter().enumerate() {
        if i % 2 == 0 {
            entry.emit(*opcode);
        } else {
            entry.emit_with_position(*opcode, SourcePosition::new(i as u32 + 1, 3, i * 10));
        }
    }
    entry.max_locals = 3;
    entry.max_stack = 4;

    let unit = unit_with(vec![BytecodeChunk::new("pair", 2)], entry);
    let restored = CompiledUnit::from_bytes(&unit.to_bytes()).unwrap();
    assert_eq!(restored, unit);
    assert_eq!(restored.entry.instructions.len(), opcodes.len());
}

#[test]
fn test_serialization_is_deterministic() {
    let mut entry = BytecodeChunk::new("main", 0);
    entry.emit(Opcode::LoadConst(0));
    entry.emit(Opcode::Return);

    let a = unit_with(vec![], entry.clone()).to_bytes();
    let b = unit_with(vec![], entry).to_bytes();
    assert_eq!(a, b);
}

#[test]
fn test_unknown_builtin_tag_is_rejected() {
    let mut entry = BytecodeChunk::new("main", 0);
    entry.emit(Opcode::CallBuiltin(Builtin::Not, 1));
    let mut bytes = unit_with(vec![], entry).to_bytes();

    // Layout of the last instruction: [16, builtin, argc, position flag]
    let builtin_at = bytes.len() - 3;
    assert_eq!(bytes[builtin_at], Builtin::Not.tag());
    bytes[builtin_at] = 250;

    assert!(matches!(
        CompiledUnit::from_bytes(&bytes),
        Err(DecodeError::UnknownTag { what: "builtin", tag: 250, .. })
    ));
}

#[test]
fn test_empty_input_is_rejected() {
    assert_eq!(CompiledUnit::from_bytes(&[]), Err(DecodeError::BadMagic));
}
