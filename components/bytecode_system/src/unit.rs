//! Compiled unit - the loadable artifact
//!
//! A unit bundles the constant pool, every named method body and the entry
//! method that runs the program's top-level forms.

use crate::chunk::BytecodeChunk;
use crate::codec::{write_string, DecodeError, Reader};
use crate::constant::ConstantPool;
use std::fmt;

/// Magic number at the start of every artifact
pub const MAGIC: &[u8; 4] = b"HRKU";

/// Artifact format version
pub const FORMAT_VERSION: u8 = 1;

/// A named executable unit: constant pool, methods and entry point
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUnit {
    /// Unit name, e.g. the source file stem or `Repl3`
    pub name: String,
    /// Literals and global names shared by all methods
    pub constants: ConstantPool,
    /// Callable methods, indexed by `Invoke`/`LoadFunction` operands
    pub methods: Vec<BytecodeChunk>,
    /// Zero-argument method executing the top-level forms
    pub entry: BytecodeChunk,
}

impl CompiledUnit {
    /// Create a unit from its parts
    pub fn new(
        name: impl Into<String>,
        constants: ConstantPool,
        methods: Vec<BytecodeChunk>,
        entry: BytecodeChunk,
    ) -> Self {
        Self {
            name: name.into(),
            constants,
            methods,
            entry,
        }
    }

    /// Get a method by index
    pub fn method(&self, idx: u16) -> Option<&BytecodeChunk> {
        self.methods.get(idx as usize)
    }

    /// Find a method by name
    pub fn find_method(&self, name: &str) -> Option<&BytecodeChunk> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Serialize unit to binary format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(MAGIC);
        bytes.push(FORMAT_VERSION);
        write_string(&mut bytes, &self.name);

        self.constants.encode(&mut bytes);

        bytes.extend_from_slice(&(self.methods.len() as u32).to_le_bytes());
        for method in &self.methods {
            method.encode(&mut bytes);
        }

        self.entry.encode(&mut bytes);
        bytes
    }

    /// Deserialize unit from binary format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);

        if reader.take(MAGIC.len()).map_err(|_| DecodeError::BadMagic)? != MAGIC {
            return Err(DecodeError::BadMagic);
        }

        let version = reader.u8()?;
        if version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let name = reader.string()?;
        let constants = ConstantPool::decode(&mut reader)?;

        let method_count = reader.u32()? as usize;
        let mut methods = Vec::with_capacity(method_count.min(reader.remaining()));
        for _ in 0..method_count {
            methods.push(BytecodeChunk::decode(&mut reader)?);
        }

        let entry = BytecodeChunk::decode(&mut reader)?;

        if reader.remaining() != 0 {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            name,
            constants,
            methods,
            entry,
        })
    }
}

impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "unit {}", self.name)?;
        if !self.constants.is_empty() {
            writeln!(f, "constants:")?;
            for (idx, constant) in self.constants.iter().enumerate() {
                writeln!(f, "  #{} = {}", idx, constant)?;
            }
        }
        for (idx, method) in self.methods.iter().enumerate() {
            write!(f, "@{} ", idx)?;
            write!(f, "{}", method)?;
        }
        write!(f, "entry ")?;
        write!(f, "{}", self.entry)
    }
}
