//! Call frame for one method invocation

use bytecode_system::{BytecodeChunk, Instruction, LocalSlot};
use core_types::Value;

use crate::error::RuntimeError;

/// Call frame representing a method invocation
///
/// Owns the method's local slots and operand stack.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame<'u> {
    /// Method being executed
    pub method: &'u BytecodeChunk,
    /// Local slots; parameters first, the rest start as nil
    pub locals: Vec<Value>,
    /// Operand stack
    pub stack: Vec<Value>,
    /// Index of the next instruction
    pub instruction_pointer: usize,
}

impl<'u> CallFrame<'u> {
    /// Create a frame for `method` with the given arguments in the first slots
    pub fn new(method: &'u BytecodeChunk, args: Vec<Value>) -> Self {
        let slot_count = (method.max_locals as usize).max(args.len());
        let mut locals = args;
        locals.resize(slot_count, Value::Nil);
        Self {
            method,
            locals,
            stack: Vec::with_capacity(method.max_stack as usize),
            instruction_pointer: 0,
        }
    }

    /// Return the current instruction and advance
    pub fn fetch(&mut self) -> Option<&'u Instruction> {
        let inst = self.method.instructions.get(self.instruction_pointer)?;
        self.instruction_pointer += 1;
        Some(inst)
    }

    /// Continue execution at instruction `target`
    pub fn jump(&mut self, target: u32) -> Result<(), RuntimeError> {
        let target = target as usize;
        if target > self.method.instructions.len() {
            return Err(RuntimeError::corrupt(format!(
                "jump target {} outside '{}'",
                target, self.method.name
            )));
        }
        self.instruction_pointer = target;
        Ok(())
    }

    /// Push a value onto the operand stack
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop the top value of the operand stack
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(|| {
            RuntimeError::corrupt(format!("operand stack underflow in '{}'", self.method.name))
        })
    }

    /// Top value of the operand stack
    pub fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or_else(|| {
            RuntimeError::corrupt(format!("operand stack underflow in '{}'", self.method.name))
        })
    }

    /// Pop `count` values, returned in push order
    pub fn pop_args(&mut self, count: u8) -> Result<Vec<Value>, RuntimeError> {
        let count = count as usize;
        if self.stack.len() < count {
            return Err(RuntimeError::corrupt(format!(
                "operand stack underflow in '{}'",
                self.method.name
            )));
        }
        Ok(self.stack.split_off(self.stack.len() - count))
    }

    /// Read a local slot
    pub fn local(&self, slot: LocalSlot) -> Result<Value, RuntimeError> {
        self.locals.get(slot.0 as usize).cloned().ok_or_else(|| {
            RuntimeError::corrupt(format!(
                "local slot {} outside '{}'",
                slot.0, self.method.name
            ))
        })
    }

    /// Write a local slot
    pub fn set_local(&mut self, slot: LocalSlot, value: Value) -> Result<(), RuntimeError> {
        match self.locals.get_mut(slot.0 as usize) {
            Some(local) => {
                *local = value;
                Ok(())
            }
            None => Err(RuntimeError::corrupt(format!(
                "local slot {} outside '{}'",
                slot.0, self.method.name
            ))),
        }
    }
}
