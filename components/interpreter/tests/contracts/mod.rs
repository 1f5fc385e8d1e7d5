//! Contract tests for interpreter API
//!
//! These tests pin down the public surface other components rely on.

use bytecode_system::{BytecodeChunk, CompiledUnit, ConstantPool, DecodeError, Opcode};
use core_types::Value;
use interpreter::{ArtifactExecutor, ExecutionContext, RuntimeError, SharedOutput, VM};
use std::io;

fn nil_artifact() -> Vec<u8> {
    let mut entry = BytecodeChunk::new("<main>", 0);
    entry.emit(Opcode::PushNil);
    entry.emit(Opcode::Return);
    CompiledUnit::new("Contract", ConstantPool::new(), vec![], entry).to_bytes()
}

/// The VM is usable through the executor trait object
#[test]
fn test_vm_is_artifact_executor() {
    let mut executor: Box<dyn ArtifactExecutor> = Box::new(VM::with_output(io::sink()));
    assert_eq!(executor.execute(&nil_artifact()).unwrap(), Value::Nil);
}

/// VM::load reports decode failures as load errors
#[test]
fn test_vm_load_contract() {
    assert!(VM::load(&nil_artifact()).is_ok());
    assert!(matches!(
        VM::load(&[]),
        Err(RuntimeError::Load(DecodeError::BadMagic))
    ));
}

/// Running the same artifact twice gives the same value
#[test]
fn test_execute_repeatable() {
    let mut vm = VM::with_output(io::sink());
    let artifact = nil_artifact();
    assert_eq!(
        vm.execute(&artifact).unwrap(),
        vm.execute(&artifact).unwrap()
    );
}

/// The VM and its output sink can move between threads
#[test]
fn test_vm_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<VM>();
    assert_send::<ExecutionContext>();
    assert_send::<SharedOutput>();
    assert_send::<RuntimeError>();
}

/// Runtime error messages are stable
#[test]
fn test_runtime_error_messages() {
    assert_eq!(
        RuntimeError::UndefinedGlobal("x".to_string()).to_string(),
        "undefined global 'x'"
    );
    assert_eq!(
        RuntimeError::StackOverflow(10).to_string(),
        "stack overflow: call depth exceeded 10"
    );
    assert_eq!(
        RuntimeError::DivisionByZero { position: None }.to_string(),
        "division by zero"
    );
}
