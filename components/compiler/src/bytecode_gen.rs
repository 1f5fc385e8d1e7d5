//! Bytecode generation from a resolved AST

use crate::ast::*;
use crate::error::invariant_violation;
use crate::scope::{Binding, Callee, Resolution};
use bytecode_system::{BytecodeChunk, CompiledUnit, Constant, ConstantPool, LocalSlot, Opcode};
use core_types::{CompileError, SourcePosition};

/// Name of the method that runs the top-level forms
pub const ENTRY_METHOD: &str = "<main>";

/// One method body under construction, with operand-stack tracking
struct MethodBuilder {
    chunk: BytecodeChunk,
    depth: u16,
    highest_slot: Option<u16>,
}

impl MethodBuilder {
    fn new(name: &str, arity: u8) -> Self {
        Self {
            chunk: BytecodeChunk::new(name, arity),
            depth: 0,
            highest_slot: None,
        }
    }

    /// Emit an instruction and apply its stack effect
    fn emit(&mut self, opcode: Opcode, position: SourcePosition) -> Result<usize, CompileError> {
        let (pops, pushes) = opcode.stack_effect();
        if self.depth < pops {
            return Err(invariant_violation(
                format!(
                    "Operand stack underflow in '{}': {} needs {} values, depth is {}",
                    self.chunk.name, opcode, pops, self.depth
                ),
                position,
            ));
        }
        if opcode == Opcode::Return && self.depth != 1 {
            return Err(invariant_violation(
                format!(
                    "Return from '{}' with operand stack depth {}",
                    self.chunk.name, self.depth
                ),
                position,
            ));
        }

        self.depth = (self.depth - pops).checked_add(pushes).ok_or_else(|| {
            invariant_violation(
                format!(
                    "Operand stack too deep in '{}': more than {} values",
                    self.chunk.name,
                    u16::MAX
                ),
                position,
            )
        })?;
        self.chunk.max_stack = self.chunk.max_stack.max(self.depth);
        if let Opcode::LoadLocal(LocalSlot(slot)) | Opcode::StoreLocal(LocalSlot(slot)) = opcode {
            self.highest_slot = Some(self.highest_slot.map_or(slot, |h| h.max(slot)));
        }

        self.chunk.emit_with_position(opcode, position);
        Ok(self.chunk.instruction_count() - 1)
    }

    /// Index the next emitted instruction will get
    fn next_index(&self, position: SourcePosition) -> Result<u32, CompileError> {
        u32::try_from(self.chunk.instruction_count())
            .map_err(|_| invariant_violation("Method body too large", position))
    }

    fn patch_jump(&mut self, jump: usize, target: u32, position: SourcePosition) -> Result<(), CompileError> {
        if self.chunk.patch_jump(jump, target) {
            Ok(())
        } else {
            Err(invariant_violation(
                format!("Instruction {} is not a branch", jump),
                position,
            ))
        }
    }

    /// Both arms of a branch must leave the same depth
    fn join(&mut self, expected: u16, position: SourcePosition) -> Result<(), CompileError> {
        if self.depth != expected {
            return Err(invariant_violation(
                format!(
                    "Unbalanced branches in '{}': depths {} and {}",
                    self.chunk.name, expected, self.depth
                ),
                position,
            ));
        }
        Ok(())
    }

    fn finish(mut self, position: SourcePosition) -> Result<BytecodeChunk, CompileError> {
        self.emit(Opcode::Return, position)?;
        let used = self.highest_slot.map_or(0, |slot| slot + 1);
        self.chunk.max_locals = self.chunk.max_locals.max(used);
        Ok(self.chunk)
    }
}

/// Code generator that converts a resolved AST into a compiled unit
pub struct CodeGenerator<'r> {
    resolution: &'r Resolution,
    constants: ConstantPool,
    methods: Vec<Option<BytecodeChunk>>,
}

impl<'r> CodeGenerator<'r> {
    /// Create a generator reading bindings from `resolution`
    pub fn new(resolution: &'r Resolution) -> Self {
        Self {
            resolution,
            constants: ConstantPool::new(),
            methods: vec![None; resolution.functions().len()],
        }
    }

    /// Generate the unit. The entry method evaluates `program` and returns its value.
    pub fn generate(mut self, unit_name: &str, program: &Expression) -> Result<CompiledUnit, CompileError> {
        let position = program.position();
        let mut entry = MethodBuilder::new(ENTRY_METHOD, 0);
        match program {
            // Top-level forms share the entry method's frame without a block scope
            Expression::Do { body, position } => self.visit_sequence(&mut entry, body, *position)?,
            other => self.visit(&mut entry, other)?,
        }
        let entry = entry.finish(position)?;

        let mut methods = Vec::with_capacity(self.methods.len());
        for (sig, method) in self.resolution.functions().iter().zip(self.methods) {
            match method {
                Some(method) => methods.push(method),
                None => {
                    return Err(invariant_violation(
                        format!("No body generated for function '{}'", sig.name),
                        position,
                    ))
                }
            }
        }

        Ok(CompiledUnit::new(unit_name, self.constants, methods, entry))
    }

    fn visit(&mut self, method: &mut MethodBuilder, expr: &Expression) -> Result<(), CompileError> {
        let position = expr.position();
        match expr {
            Expression::Const { value, .. } => self.visit_const(method, value, position),
            Expression::Sym { .. } => self.visit_sym(method, expr),
            Expression::Def { value, .. } => self.visit_def(method, expr, value),
            Expression::Defn {
                name, params, body, ..
            } => self.visit_defn(method, expr, name, params.len(), body),
            Expression::Let { binding, body, .. } => self.visit_let(method, expr, binding, body),
            Expression::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.visit_if(method, condition, then_branch, else_branch, position),
            Expression::Do { body, .. } => self.visit_sequence(method, body, position),
            Expression::Cond { clauses, .. } => self.visit_cond(method, clauses, position),
            Expression::FnCall { args, .. } => self.visit_call(method, expr, args),
            Expression::Compose { first, steps, .. } => self.visit_compose(method, first, steps),
        }
    }

    fn visit_const(
        &mut self,
        method: &mut MethodBuilder,
        value: &ConstValue,
        position: SourcePosition,
    ) -> Result<(), CompileError> {
        let opcode = match value {
            ConstValue::Nil => Opcode::PushNil,
            ConstValue::Bool(true) => Opcode::PushTrue,
            ConstValue::Bool(false) => Opcode::PushFalse,
            ConstValue::Long(n) => match i16::try_from(*n) {
                Ok(short) => Opcode::PushShort(short),
                Err(_) => Opcode::LoadConst(self.constant(Constant::Long(*n), position)?),
            },
            ConstValue::Double(n) => Opcode::LoadConst(self.constant(Constant::Double(*n), position)?),
            ConstValue::Str(s) => Opcode::LoadConst(self.constant(Constant::Str(s.clone()), position)?),
        };
        method.emit(opcode, position)?;
        Ok(())
    }

    fn visit_sym(&mut self, method: &mut MethodBuilder, expr: &Expression) -> Result<(), CompileError> {
        let position = expr.position();
        let opcode = match self.binding(expr)? {
            Binding::Local(slot) => Opcode::LoadLocal(*slot),
            Binding::Global(name) => Opcode::LoadGlobal(self.global(name, position)?),
            Binding::Function(index) => Opcode::LoadFunction(*index),
        };
        method.emit(opcode, position)?;
        Ok(())
    }

    /// `def` leaves the assigned value on the stack
    fn visit_def(
        &mut self,
        method: &mut MethodBuilder,
        expr: &Expression,
        value: &Expression,
    ) -> Result<(), CompileError> {
        let position = expr.position();
        self.visit(method, value)?;
        method.emit(Opcode::Dup, position)?;
        let opcode = match self.binding(expr)? {
            Binding::Local(slot) => Opcode::StoreLocal(*slot),
            Binding::Global(name) => Opcode::StoreGlobal(self.global(name, position)?),
            Binding::Function(_) => return Err(invariant_violation("'def' bound to a function", position)),
        };
        method.emit(opcode, position)?;
        Ok(())
    }

    /// Generate the function's own method; the form itself evaluates to the function
    fn visit_defn(
        &mut self,
        method: &mut MethodBuilder,
        expr: &Expression,
        name: &str,
        param_count: usize,
        body: &Expression,
    ) -> Result<(), CompileError> {
        let position = expr.position();
        let index = match self.binding(expr)? {
            Binding::Function(index) => *index,
            _ => return Err(invariant_violation("'defn' not bound to a function", position)),
        };
        let arity = u8::try_from(param_count)
            .map_err(|_| invariant_violation("Too many parameters", position))?;

        let mut function = MethodBuilder::new(name, arity);
        self.visit(&mut function, body)?;
        let chunk = function.finish(body.position())?;

        match self.methods.get_mut(index as usize) {
            Some(slot) => *slot = Some(chunk),
            None => {
                return Err(invariant_violation(
                    format!("Function index {} out of range", index),
                    position,
                ))
            }
        }
        method.emit(Opcode::LoadFunction(index), position)?;
        Ok(())
    }

    fn visit_let(
        &mut self,
        method: &mut MethodBuilder,
        expr: &Expression,
        binding: &Expression,
        body: &Expression,
    ) -> Result<(), CompileError> {
        let position = expr.position();
        let slot = match self.binding(expr)? {
            Binding::Local(slot) => *slot,
            _ => return Err(invariant_violation("'let' not bound to a local", position)),
        };
        self.visit(method, binding)?;
        method.emit(Opcode::StoreLocal(slot), position)?;
        self.visit(method, body)
    }

    fn visit_if(
        &mut self,
        method: &mut MethodBuilder,
        condition: &Expression,
        then_branch: &Expression,
        else_branch: &Expression,
        position: SourcePosition,
    ) -> Result<(), CompileError> {
        self.visit(method, condition)?;
        let else_jump = method.emit(Opcode::JumpIfFalse(0), position)?;
        let base = method.depth;

        self.visit(method, then_branch)?;
        let then_depth = method.depth;
        let end_jump = method.emit(Opcode::Jump(0), position)?;

        let else_target = method.next_index(position)?;
        method.patch_jump(else_jump, else_target, position)?;
        method.depth = base;
        self.visit(method, else_branch)?;
        method.join(then_depth, position)?;

        let end_target = method.next_index(position)?;
        method.patch_jump(end_jump, end_target, position)
    }

    /// Clauses are tested in order; falling through pushes nil
    fn visit_cond(
        &mut self,
        method: &mut MethodBuilder,
        clauses: &[CondClause],
        position: SourcePosition,
    ) -> Result<(), CompileError> {
        let base = method.depth;
        let mut end_jumps = Vec::with_capacity(clauses.len());

        for clause in clauses {
            self.visit(method, &clause.test)?;
            let next_jump = method.emit(Opcode::JumpIfFalse(0), position)?;
            self.visit(method, &clause.consequent)?;
            method.join(base + 1, clause.consequent.position())?;
            end_jumps.push(method.emit(Opcode::Jump(0), position)?);

            let next_target = method.next_index(position)?;
            method.patch_jump(next_jump, next_target, position)?;
            method.depth = base;
        }
        method.emit(Opcode::PushNil, position)?;

        let end_target = method.next_index(position)?;
        for jump in end_jumps {
            method.patch_jump(jump, end_target, position)?;
        }
        Ok(())
    }

    fn visit_call(
        &mut self,
        method: &mut MethodBuilder,
        expr: &Expression,
        args: &[Expression],
    ) -> Result<(), CompileError> {
        let position = expr.position();
        for arg in args {
            self.visit(method, arg)?;
        }
        let argc = u8::try_from(args.len())
            .map_err(|_| invariant_violation("Too many arguments", position))?;
        let callee = self.callee(expr.id(), position)?;
        method.emit(call_opcode(callee, argc), position)?;
        Ok(())
    }

    fn visit_compose(
        &mut self,
        method: &mut MethodBuilder,
        first: &Expression,
        steps: &[ComposeStep],
    ) -> Result<(), CompileError> {
        self.visit(method, first)?;
        for step in steps {
            let callee = self.callee(step.id(), step.position)?;
            method.emit(call_opcode(callee, 1), step.position)?;
        }
        Ok(())
    }

    /// Evaluate expressions in order, keeping only the last value
    fn visit_sequence(
        &mut self,
        method: &mut MethodBuilder,
        body: &[Expression],
        position: SourcePosition,
    ) -> Result<(), CompileError> {
        if body.is_empty() {
            method.emit(Opcode::PushNil, position)?;
            return Ok(());
        }
        for (i, expr) in body.iter().enumerate() {
            if i > 0 {
                method.emit(Opcode::Pop, expr.position())?;
            }
            self.visit(method, expr)?;
        }
        Ok(())
    }

    fn binding(&self, expr: &Expression) -> Result<&'r Binding, CompileError> {
        self.resolution.binding(expr.id()).ok_or_else(|| {
            invariant_violation(
                format!("No binding recorded for `{}`", expr),
                expr.position(),
            )
        })
    }

    fn callee(&self, id: NodeId, position: SourcePosition) -> Result<Callee, CompileError> {
        self.resolution
            .callee(id)
            .ok_or_else(|| invariant_violation("No call target recorded", position))
    }

    fn constant(&mut self, constant: Constant, position: SourcePosition) -> Result<u16, CompileError> {
        self.constants
            .add(constant)
            .ok_or_else(|| invariant_violation("Constant pool overflow", position))
    }

    fn global(&mut self, name: &str, position: SourcePosition) -> Result<u16, CompileError> {
        self.constant(Constant::Str(name.to_string()), position)
    }
}

fn call_opcode(callee: Callee, argc: u8) -> Opcode {
    match callee {
        Callee::Function(index) => Opcode::Invoke(index, argc),
        Callee::Builtin(builtin) => Opcode::CallBuiltin(builtin, argc),
    }
}
