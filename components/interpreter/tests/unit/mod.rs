//! Unit tests for interpreter components
//!
//! Programs are assembled by hand so these tests do not depend on the compiler.

use bytecode_system::{Builtin, BytecodeChunk, CompiledUnit, Constant, ConstantPool, LocalSlot, Opcode};
use core_types::{SourcePosition, Value};
use interpreter::{ArtifactExecutor, RuntimeError, SharedOutput, VM};
use std::io;

fn entry(opcodes: &[Opcode]) -> BytecodeChunk {
    let mut chunk = BytecodeChunk::new("<main>", 0);
    for op in opcodes {
        chunk.emit(*op);
    }
    chunk
}

fn run(unit: &CompiledUnit) -> Result<Value, RuntimeError> {
    VM::with_output(io::sink()).run(unit)
}

/// `(defn fact [n] (if (<= n 1) 1 (* n (fact (- n 1)))))`
fn factorial() -> BytecodeChunk {
    let mut fact = BytecodeChunk::new("fact", 1);
    for op in [
        Opcode::LoadLocal(LocalSlot(0)),
        Opcode::PushShort(1),
        Opcode::CallBuiltin(Builtin::LessEqual, 2),
        Opcode::JumpIfFalse(6),
        Opcode::PushShort(1),
        Opcode::Jump(12),
        Opcode::LoadLocal(LocalSlot(0)),
        Opcode::LoadLocal(LocalSlot(0)),
        Opcode::PushShort(1),
        Opcode::CallBuiltin(Builtin::Sub, 2),
        Opcode::Invoke(0, 1),
        Opcode::CallBuiltin(Builtin::Mul, 2),
        Opcode::Return,
    ] {
        fact.emit(op);
    }
    fact
}

// ============================================================================
// Execution Tests
// ============================================================================

#[test]
fn test_literals() {
    let mut constants = ConstantPool::new();
    let big = constants.add(Constant::Long(i64::MIN)).unwrap();
    let unit = CompiledUnit::new(
        "T",
        constants,
        vec![],
        entry(&[Opcode::LoadConst(big), Opcode::Return]),
    );
    assert_eq!(run(&unit).unwrap(), Value::Long(i64::MIN));
}

#[test]
fn test_recursive_factorial() {
    let unit = CompiledUnit::new(
        "Fact",
        ConstantPool::new(),
        vec![factorial()],
        entry(&[Opcode::PushShort(10), Opcode::Invoke(0, 1), Opcode::Return]),
    );
    assert_eq!(run(&unit).unwrap(), Value::Long(3_628_800));
}

#[test]
fn test_arguments_bind_in_order() {
    let mut sub = BytecodeChunk::new("sub", 2);
    sub.emit(Opcode::LoadLocal(LocalSlot(0)));
    sub.emit(Opcode::LoadLocal(LocalSlot(1)));
    sub.emit(Opcode::CallBuiltin(Builtin::Sub, 2));
    sub.emit(Opcode::Return);

    let unit = CompiledUnit::new(
        "Sub",
        ConstantPool::new(),
        vec![sub],
        entry(&[
            Opcode::PushShort(10),
            Opcode::PushShort(3),
            Opcode::Invoke(0, 2),
            Opcode::Return,
        ]),
    );
    assert_eq!(run(&unit).unwrap(), Value::Long(7));
}

#[test]
fn test_mutual_recursion() {
    // even? and odd? calling each other through Invoke
    let mut even = BytecodeChunk::new("even?", 1);
    let mut odd = BytecodeChunk::new("odd?", 1);
    for (chunk, base, other) in [(&mut even, Opcode::PushTrue, 1), (&mut odd, Opcode::PushFalse, 0)] {
        for op in [
            Opcode::LoadLocal(LocalSlot(0)),
            Opcode::PushShort(0),
            Opcode::CallBuiltin(Builtin::Equal, 2),
            Opcode::JumpIfFalse(6),
            base,
            Opcode::Return,
            Opcode::LoadLocal(LocalSlot(0)),
            Opcode::PushShort(1),
            Opcode::CallBuiltin(Builtin::Sub, 2),
            Opcode::Invoke(other, 1),
            Opcode::Return,
        ] {
            chunk.emit(op);
        }
    }

    let unit = CompiledUnit::new(
        "Parity",
        ConstantPool::new(),
        vec![even, odd],
        entry(&[Opcode::PushShort(7), Opcode::Invoke(1, 1), Opcode::Return]),
    );
    assert_eq!(run(&unit).unwrap(), Value::Bool(true));
}

#[test]
fn test_function_reference_value() {
    let unit = CompiledUnit::new(
        "F",
        ConstantPool::new(),
        vec![factorial()],
        entry(&[Opcode::LoadFunction(0), Opcode::Return]),
    );
    assert_eq!(run(&unit).unwrap(), Value::Function("fact".to_string()));
}

#[test]
fn test_println_writes_display_form() {
    let mut constants = ConstantPool::new();
    let s = constants.add(Constant::Str("hi there".to_string())).unwrap();
    let unit = CompiledUnit::new(
        "Print",
        constants,
        vec![],
        entry(&[
            Opcode::LoadConst(s),
            Opcode::CallBuiltin(Builtin::Println, 1),
            Opcode::Pop,
            Opcode::PushShort(3),
            Opcode::CallBuiltin(Builtin::Println, 1),
            Opcode::Return,
        ]),
    );

    let output = SharedOutput::new();
    let mut vm = VM::with_output(output.clone());
    assert_eq!(vm.run(&unit).unwrap(), Value::Nil);
    assert_eq!(output.contents(), "hi there\n3\n");
}

#[test]
fn test_globals_survive_calls() {
    let mut constants = ConstantPool::new();
    let x = constants.add(Constant::Str("x".to_string())).unwrap();

    let mut read_x = BytecodeChunk::new("read-x", 0);
    read_x.emit(Opcode::LoadGlobal(x));
    read_x.emit(Opcode::Return);

    let unit = CompiledUnit::new(
        "Globals",
        constants,
        vec![read_x],
        entry(&[
            Opcode::PushShort(99),
            Opcode::StoreGlobal(x),
            Opcode::Invoke(0, 0),
            Opcode::Return,
        ]),
    );
    let mut vm = VM::with_output(io::sink());
    assert_eq!(vm.run(&unit).unwrap(), Value::Long(99));
    assert_eq!(vm.get_global("x"), Some(Value::Long(99)));
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_division_by_zero_carries_position() {
    let mut main = entry(&[Opcode::PushShort(1), Opcode::PushShort(0)]);
    main.emit_with_position(Opcode::CallBuiltin(Builtin::Div, 2), SourcePosition::new(3, 4, 20));
    main.emit(Opcode::Return);
    let unit = CompiledUnit::new("Div", ConstantPool::new(), vec![], main);

    let err = run(&unit).unwrap_err();
    assert_eq!(err.to_string(), "division by zero at 3:4");
}

#[test]
fn test_type_error_carries_position() {
    let mut main = entry(&[Opcode::PushTrue, Opcode::PushShort(1)]);
    main.emit_with_position(Opcode::CallBuiltin(Builtin::Add, 2), SourcePosition::new(1, 1, 0));
    main.emit(Opcode::Return);
    let unit = CompiledUnit::new("Type", ConstantPool::new(), vec![], main);

    match run(&unit) {
        Err(RuntimeError::Type { position, .. }) => {
            assert_eq!(position, Some(SourcePosition::new(1, 1, 0)))
        }
        other => panic!("expected type error, got {:?}", other),
    }
}

#[test]
fn test_unbounded_recursion_overflows() {
    let mut forever = BytecodeChunk::new("forever", 0);
    forever.emit(Opcode::Invoke(0, 0));
    forever.emit(Opcode::Return);

    let unit = CompiledUnit::new(
        "Loop",
        ConstantPool::new(),
        vec![forever],
        entry(&[Opcode::Invoke(0, 0), Opcode::Return]),
    );
    let mut vm = VM::with_output(io::sink()).with_max_call_depth(100);
    assert!(matches!(vm.run(&unit), Err(RuntimeError::StackOverflow(100))));
}

#[test]
fn test_invoke_arity_mismatch_is_corrupt() {
    let unit = CompiledUnit::new(
        "Bad",
        ConstantPool::new(),
        vec![factorial()],
        entry(&[Opcode::Invoke(0, 0), Opcode::Return]),
    );
    assert!(matches!(run(&unit), Err(RuntimeError::Corrupt(_))));
}

#[test]
fn test_truncated_artifact() {
    let unit = CompiledUnit::new(
        "Fact",
        ConstantPool::new(),
        vec![factorial()],
        entry(&[Opcode::PushShort(5), Opcode::Invoke(0, 1), Opcode::Return]),
    );
    let bytes = unit.to_bytes();

    let mut vm = VM::with_output(io::sink());
    assert_eq!(vm.execute(&bytes).unwrap(), Value::Long(120));
    assert!(matches!(
        vm.execute(&bytes[..bytes.len() - 3]),
        Err(RuntimeError::Load(_))
    ));
}
