//! Little-endian primitives for the artifact binary format.

use thiserror::Error;

/// Errors raised while decoding a binary artifact
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended before a complete value could be read
    #[error("unexpected end of artifact at byte {0}")]
    UnexpectedEnd(usize),
    /// The artifact does not start with the expected magic number
    #[error("invalid magic number")]
    BadMagic,
    /// The artifact was written by an unsupported format version
    #[error("unsupported artifact version {0}")]
    UnsupportedVersion(u8),
    /// A tag byte does not name a known entry
    #[error("unknown {what} tag {tag} at byte {offset}")]
    UnknownTag {
        /// What kind of entry was being decoded
        what: &'static str,
        /// The offending tag
        tag: u8,
        /// Byte offset of the tag
        offset: usize,
    },
    /// A string is not valid UTF-8
    #[error("invalid UTF-8 string at byte {0}")]
    InvalidUtf8(usize),
    /// Bytes remain after the entry method
    #[error("{0} trailing bytes after artifact")]
    TrailingBytes(usize),
}

/// Cursor over an artifact's bytes
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEnd(self.bytes.len()));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    pub(crate) fn f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    pub(crate) fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.u32()? as usize;
        let start = self.offset;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8(start))
    }
}

pub(crate) fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}
