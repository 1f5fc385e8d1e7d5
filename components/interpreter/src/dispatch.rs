//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution. Calls push a new [`CallFrame`] on an
//! explicit frame stack rather than recursing on the native stack.

use bytecode_system::{Builtin, CompiledUnit, Constant, Opcode};
use core_types::Value;
use tracing::trace;

use crate::builtins;
use crate::call_frame::CallFrame;
use crate::context::ExecutionContext;
use crate::error::RuntimeError;

/// Executes the entry method of a unit
pub struct Dispatcher<'u> {
    unit: &'u CompiledUnit,
    max_call_depth: usize,
}

impl<'u> Dispatcher<'u> {
    /// Create a dispatcher for `unit` allowing at most `max_call_depth` nested frames
    pub fn new(unit: &'u CompiledUnit, max_call_depth: usize) -> Self {
        Self {
            unit,
            max_call_depth,
        }
    }

    /// Run the entry method to completion and return its value
    pub fn run(&self, ctx: &mut ExecutionContext) -> Result<Value, RuntimeError> {
        let mut frames = vec![CallFrame::new(&self.unit.entry, Vec::new())];

        loop {
            let frame = frames
                .last_mut()
                .ok_or_else(|| RuntimeError::corrupt("empty call stack"))?;
            let inst = frame.fetch().ok_or_else(|| {
                RuntimeError::corrupt(format!(
                    "'{}' ended without Return",
                    frame.method.name
                ))
            })?;
            let position = inst.source_position;

            match inst.opcode {
                Opcode::PushNil => frame.push(Value::Nil),
                Opcode::PushTrue => frame.push(Value::Bool(true)),
                Opcode::PushFalse => frame.push(Value::Bool(false)),
                Opcode::PushShort(n) => frame.push(Value::Long(n as i64)),
                Opcode::LoadConst(idx) => frame.push(self.constant(idx)?),

                Opcode::LoadLocal(slot) => {
                    let value = frame.local(slot)?;
                    frame.push(value);
                }
                Opcode::StoreLocal(slot) => {
                    let value = frame.pop()?;
                    frame.set_local(slot, value)?;
                }
                Opcode::LoadGlobal(idx) => {
                    let name = self.global_name(idx)?;
                    let value = ctx
                        .get_global(name)
                        .cloned()
                        .ok_or_else(|| RuntimeError::UndefinedGlobal(name.to_string()))?;
                    frame.push(value);
                }
                Opcode::StoreGlobal(idx) => {
                    let name = self.global_name(idx)?;
                    let value = frame.pop()?;
                    ctx.set_global(name.to_string(), value);
                }
                Opcode::LoadFunction(idx) => {
                    let method = self.method(idx)?;
                    frame.push(Value::Function(method.name.clone()));
                }

                Opcode::Dup => {
                    let value = frame.peek()?.clone();
                    frame.push(value);
                }
                Opcode::Pop => {
                    frame.pop()?;
                }

                Opcode::Jump(target) => frame.jump(target)?,
                Opcode::JumpIfFalse(target) => {
                    if !frame.pop()?.is_truthy() {
                        frame.jump(target)?;
                    }
                }

                Opcode::Return => {
                    let value = frame.pop()?;
                    frames.pop();
                    match frames.last_mut() {
                        Some(caller) => caller.push(value),
                        None => return Ok(value),
                    }
                }

                Opcode::Invoke(idx, argc) => {
                    let method = self.method(idx)?;
                    if method.arity != argc {
                        return Err(RuntimeError::corrupt(format!(
                            "'{}' takes {} arguments, invoked with {}",
                            method.name, method.arity, argc
                        )));
                    }
                    let args = frame.pop_args(argc)?;
                    if frames.len() >= self.max_call_depth {
                        return Err(RuntimeError::StackOverflow(self.max_call_depth));
                    }
                    trace!(method = %method.name, depth = frames.len(), "invoke");
                    frames.push(CallFrame::new(method, args));
                }

                Opcode::CallBuiltin(builtin, argc) => {
                    let args = frame.pop_args(argc)?;
                    let value = match builtin {
                        Builtin::Println => {
                            let [value] = <[Value; 1]>::try_from(args).map_err(|args| {
                                RuntimeError::corrupt(format!(
                                    "'println' called with {} arguments",
                                    args.len()
                                ))
                            })?;
                            ctx.write_line(&value.to_string())?;
                            Value::Nil
                        }
                        _ => builtins::apply(builtin, &args).map_err(|e| e.at_position(position))?,
                    };
                    frame.push(value);
                }
            }
        }
    }

    fn constant(&self, idx: u16) -> Result<Value, RuntimeError> {
        match self.unit.constants.get(idx) {
            Some(Constant::Long(n)) => Ok(Value::Long(*n)),
            Some(Constant::Double(n)) => Ok(Value::Double(*n)),
            Some(Constant::Str(s)) => Ok(Value::Str(s.clone())),
            None => Err(RuntimeError::corrupt(format!(
                "constant #{} out of range",
                idx
            ))),
        }
    }

    fn global_name(&self, idx: u16) -> Result<&'u str, RuntimeError> {
        self.unit.constants.get_str(idx).ok_or_else(|| {
            RuntimeError::corrupt(format!("constant #{} is not a global name", idx))
        })
    }

    fn method(&self, idx: u16) -> Result<&'u bytecode_system::BytecodeChunk, RuntimeError> {
        self.unit
            .method(idx)
            .ok_or_else(|| RuntimeError::corrupt(format!("method @{} out of range", idx)))
    }
}
