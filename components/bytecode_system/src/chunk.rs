//! Bytecode chunk - one compiled method body
//!
//! Contains instructions plus the frame metadata the executor needs to
//! allocate a call frame: parameter count, local slot count and maximum
//! operand-stack depth.

use crate::codec::{write_string, DecodeError, Reader};
use crate::instruction::Instruction;
use crate::opcode::{Builtin, LocalSlot, Opcode};
use core_types::SourcePosition;
use std::fmt;

/// A compiled method body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BytecodeChunk {
    /// Method name
    pub name: String,
    /// Number of parameters; they occupy slots `0..arity`
    pub arity: u8,
    /// Number of local slots the frame needs
    pub max_locals: u16,
    /// Maximum operand-stack depth reached
    pub max_stack: u16,
    /// Sequence of bytecode instructions
    pub instructions: Vec<Instruction>,
}

impl BytecodeChunk {
    /// Create a new empty method body
    pub fn new(name: impl Into<String>, arity: u8) -> Self {
        Self {
            name: name.into(),
            arity,
            max_locals: arity as u16,
            max_stack: 0,
            instructions: Vec::new(),
        }
    }

    /// Emit an instruction without source position
    pub fn emit(&mut self, opcode: Opcode) {
        self.instructions.push(Instruction::new(opcode));
    }

    /// Emit an instruction with source position
    pub fn emit_with_position(&mut self, opcode: Opcode, position: SourcePosition) {
        self.instructions
            .push(Instruction::with_position(opcode, position));
    }

    /// Point the branch at `index` to `target`.
    ///
    /// Returns false if the instruction at `index` is not a branch.
    pub fn patch_jump(&mut self, index: usize, target: u32) -> bool {
        match self.instructions.get_mut(index).map(|i| &mut i.opcode) {
            Some(Opcode::Jump(t)) | Some(Opcode::JumpIfFalse(t)) => {
                *t = target;
                true
            }
            _ => false,
        }
    }

    /// Get the number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Serialize method body to binary format
    pub fn encode(&self, out: &mut Vec<u8>) {
        write_string(out, &self.name);
        out.push(self.arity);
        out.extend_from_slice(&self.max_locals.to_le_bytes());
        out.extend_from_slice(&self.max_stack.to_le_bytes());
        out.extend_from_slice(&(self.instructions.len() as u32).to_le_bytes());
        for inst in &self.instructions {
            Self::encode_instruction(inst, out);
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let name = reader.string()?;
        let arity = reader.u8()?;
        let max_locals = reader.u16()?;
        let max_stack = reader.u16()?;
        let count = reader.u32()? as usize;

        // Every instruction takes at least two bytes; reject absurd counts early.
        if count > reader.remaining() / 2 {
            return Err(DecodeError::UnexpectedEnd(reader.offset() + reader.remaining()));
        }

        let mut instructions = Vec::with_capacity(count);
        for _ in 0..count {
            instructions.push(Self::decode_instruction(reader)?);
        }

        Ok(Self {
            name,
            arity,
            max_locals,
            max_stack,
            instructions,
        })
    }

    /// Encode a single instruction to bytes
    fn encode_instruction(inst: &Instruction, out: &mut Vec<u8>) {
        let (tag, data) = Self::encode_opcode(&inst.opcode);
        out.push(tag);
        out.extend_from_slice(&data);

        match &inst.source_position {
            Some(pos) => {
                out.push(1);
                out.extend_from_slice(&pos.line.to_le_bytes());
                out.extend_from_slice(&pos.column.to_le_bytes());
                out.extend_from_slice(&(pos.offset as u32).to_le_bytes());
            }
            None => out.push(0),
        }
    }

    /// Encode opcode to tag and operand bytes
    fn encode_opcode(opcode: &Opcode) -> (u8, Vec<u8>) {
        match opcode {
            Opcode::PushNil => (0, vec![]),
            Opcode::PushTrue => (1, vec![]),
            Opcode::PushFalse => (2, vec![]),
            Opcode::PushShort(n) => (3, n.to_le_bytes().to_vec()),
            Opcode::LoadConst(idx) => (4, idx.to_le_bytes().to_vec()),
            Opcode::LoadLocal(slot) => (5, slot.0.to_le_bytes().to_vec()),
            Opcode::StoreLocal(slot) => (6, slot.0.to_le_bytes().to_vec()),
            Opcode::LoadGlobal(idx) => (7, idx.to_le_bytes().to_vec()),
            Opcode::StoreGlobal(idx) => (8, idx.to_le_bytes().to_vec()),
            Opcode::LoadFunction(idx) => (9, idx.to_le_bytes().to_vec()),
            Opcode::Dup => (10, vec![]),
            Opcode::Pop => (11, vec![]),
            Opcode::Jump(target) => (12, target.to_le_bytes().to_vec()),
            Opcode::JumpIfFalse(target) => (13, target.to_le_bytes().to_vec()),
            Opcode::Return => (14, vec![]),
            Opcode::Invoke(idx, argc) => {
                let mut data = idx.to_le_bytes().to_vec();
                data.push(*argc);
                (15, data)
            }
            Opcode::CallBuiltin(builtin, argc) => (16, vec![builtin.tag(), *argc]),
        }
    }

    /// Decode instruction from bytes
    fn decode_instruction(reader: &mut Reader<'_>) -> Result<Instruction, DecodeError> {
        let opcode = Self::decode_opcode(reader)?;

        let flag_offset = reader.offset();
        let source_position = match reader.u8()? {
            0 => None,
            1 => {
                let line = reader.u32()?;
                let column = reader.u32()?;
                let offset = reader.u32()? as usize;
                Some(SourcePosition::new(line, column, offset))
            }
            tag => {
                return Err(DecodeError::UnknownTag {
                    what: "position flag",
                    tag,
                    offset: flag_offset,
                })
            }
        };

        Ok(Instruction {
            opcode,
            source_position,
        })
    }

    /// Decode opcode from bytes
    fn decode_opcode(reader: &mut Reader<'_>) -> Result<Opcode, DecodeError> {
        let offset = reader.offset();
        let tag = reader.u8()?;

        let opcode = match tag {
            0 => Opcode::PushNil,
            1 => Opcode::PushTrue,
            2 => Opcode::PushFalse,
            3 => Opcode::PushShort(reader.i16()?),
            4 => Opcode::LoadConst(reader.u16()?),
            5 => Opcode::LoadLocal(LocalSlot(reader.u16()?)),
            6 => Opcode::StoreLocal(LocalSlot(reader.u16()?)),
            7 => Opcode::LoadGlobal(reader.u16()?),
            8 => Opcode::StoreGlobal(reader.u16()?),
            9 => Opcode::LoadFunction(reader.u16()?),
            10 => Opcode::Dup,
            11 => Opcode::Pop,
            12 => Opcode::Jump(reader.u32()?),
            13 => Opcode::JumpIfFalse(reader.u32()?),
            14 => Opcode::Return,
            15 => {
                let idx = reader.u16()?;
                let argc = reader.u8()?;
                Opcode::Invoke(idx, argc)
            }
            16 => {
                let builtin_offset = reader.offset();
                let builtin_tag = reader.u8()?;
                let builtin =
                    Builtin::from_tag(builtin_tag).ok_or(DecodeError::UnknownTag {
                        what: "builtin",
                        tag: builtin_tag,
                        offset: builtin_offset,
                    })?;
                Opcode::CallBuiltin(builtin, reader.u8()?)
            }
            _ => {
                return Err(DecodeError::UnknownTag {
                    what: "opcode",
                    tag,
                    offset,
                })
            }
        };

        Ok(opcode)
    }
}

impl fmt::Display for BytecodeChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "method {}/{} (locals={}, stack={})",
            self.name, self.arity, self.max_locals, self.max_stack
        )?;
        for (idx, inst) in self.instructions.iter().enumerate() {
            match &inst.source_position {
                Some(pos) => writeln!(f, "  {:04}  {:<28} ; {}", idx, inst.opcode.to_string(), pos)?,
                None => writeln!(f, "  {:04}  {}", idx, inst.opcode)?,
            }
        }
        Ok(())
    }
}
