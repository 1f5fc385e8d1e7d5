//! Constant pool for literal values
//!
//! Long literals outside the inline range, every double, every string and
//! every global name are stored once per compiled unit and referenced by
//! index.

use crate::codec::{write_string, DecodeError, Reader};
use std::collections::HashMap;
use std::fmt;

/// A pooled literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// 64-bit signed integer
    Long(i64),
    /// IEEE 754 double
    Double(f64),
    /// UTF-8 string
    Str(String),
}

/// Hashable identity of a constant; doubles compare by bit pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Long(i64),
    Double(u64),
    Str(String),
}

impl Constant {
    fn key(&self) -> ConstantKey {
        match self {
            Constant::Long(n) => ConstantKey::Long(*n),
            Constant::Double(d) => ConstantKey::Double(d.to_bits()),
            Constant::Str(s) => ConstantKey::Str(s.clone()),
        }
    }

    /// Encode constant to bytes for serialization
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Constant::Long(n) => {
                out.push(0);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Constant::Double(d) => {
                out.push(1);
                out.extend_from_slice(&d.to_le_bytes());
            }
            Constant::Str(s) => {
                out.push(2);
                write_string(out, s);
            }
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let offset = reader.offset();
        match reader.u8()? {
            0 => Ok(Constant::Long(reader.i64()?)),
            1 => Ok(Constant::Double(reader.f64()?)),
            2 => Ok(Constant::Str(reader.string()?)),
            tag => Err(DecodeError::UnknownTag {
                what: "constant",
                tag,
                offset,
            }),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Long(n) => write!(f, "long {}", n),
            Constant::Double(d) => write!(f, "double {:?}", d),
            Constant::Str(s) => write!(f, "string {:?}", s),
        }
    }
}

/// Deduplicating constant pool shared by every method of a unit
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
    index: HashMap<ConstantKey, u16>,
}

impl ConstantPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constant and return its index, reusing an equal entry.
    ///
    /// Returns `None` once the pool holds `u16::MAX + 1` entries.
    pub fn add(&mut self, constant: Constant) -> Option<u16> {
        let key = constant.key();
        if let Some(&idx) = self.index.get(&key) {
            return Some(idx);
        }
        let idx = u16::try_from(self.entries.len()).ok()?;
        self.entries.push(constant);
        self.index.insert(key, idx);
        Some(idx)
    }

    /// Get the constant at an index
    pub fn get(&self, idx: u16) -> Option<&Constant> {
        self.entries.get(idx as usize)
    }

    /// Get the string constant at an index
    pub fn get_str(&self, idx: u16) -> Option<&str> {
        match self.get(idx) {
            Some(Constant::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in index order
    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.entries.iter()
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for constant in &self.entries {
            constant.encode(out);
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let count = reader.u32()? as usize;
        let mut pool = ConstantPool::new();
        for _ in 0..count {
            let constant = Constant::decode(reader)?;
            // Decoded pools keep their layout even if an encoder wrote duplicates.
            let idx = pool.entries.len() as u16;
            pool.index.entry(constant.key()).or_insert(idx);
            pool.entries.push(constant);
        }
        Ok(pool)
    }
}

impl PartialEq for ConstantPool {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
