//! Canonical byte encoding shared by signing, hashing and evidence parsing.
//!
//! Integers are little-endian; lengths and counts use the CompactSize var-int.
//! Every payload's "unsigned" form is built with these helpers, and verifiers
//! always re-derive it instead of trusting a cached digest.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::CodecError;

/// Upper bound for any single length-prefixed field read from untrusted bytes.
pub const MAX_VAR_BYTES: u64 = 8 * 1024 * 1024;

/// Upper bound for element counts read from untrusted bytes.
pub const MAX_ARRAY_COUNT: u64 = 4096;

// -----------------------------------------------------------------------------
// Writing
// -----------------------------------------------------------------------------

/// Encodes `n` as CompactSize and appends to `buf`.
/// 0–252: 1 byte; 253–0xFFFF: 0xFD + 2B LE; 0x10000–0xFFFFFFFF: 0xFE + 4B LE; else 0xFF + 8B LE.
#[inline]
pub fn write_var_uint(buf: &mut Vec<u8>, n: u64) {
    if n < 253 {
        buf.push(n as u8);
    } else if n <= 0xFFFF {
        buf.push(0xfd);
        write_u16(buf, n as u16);
    } else if n <= 0xFFFF_FFFF {
        buf.push(0xfe);
        write_u32(buf, n as u32);
    } else {
        buf.push(0xff);
        write_u64(buf, n);
    }
}

#[inline]
pub fn write_u16(buf: &mut Vec<u8>, v: u16) {
    let mut b = [0u8; 2];
    LittleEndian::write_u16(&mut b, v);
    buf.extend_from_slice(&b);
}

#[inline]
pub fn write_u32(buf: &mut Vec<u8>, v: u32) {
    let mut b = [0u8; 4];
    LittleEndian::write_u32(&mut b, v);
    buf.extend_from_slice(&b);
}

#[inline]
pub fn write_u64(buf: &mut Vec<u8>, v: u64) {
    let mut b = [0u8; 8];
    LittleEndian::write_u64(&mut b, v);
    buf.extend_from_slice(&b);
}

#[inline]
pub fn write_i64(buf: &mut Vec<u8>, v: i64) {
    let mut b = [0u8; 8];
    LittleEndian::write_i64(&mut b, v);
    buf.extend_from_slice(&b);
}

/// Length-prefixed byte string.
#[inline]
pub fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_var_uint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

#[inline]
pub fn write_var_string(buf: &mut Vec<u8>, s: &str) {
    write_var_bytes(buf, s.as_bytes());
}

#[inline]
pub fn write_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(u8::from(v));
}

// -----------------------------------------------------------------------------
// Reading
// -----------------------------------------------------------------------------

/// Bounded cursor over untrusted bytes. Every read checks the remaining
/// length first; length prefixes are capped before any allocation.
pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Fails with `TrailingData` unless the whole input was consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.data.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingData(self.data.len()))
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.data.len() < n {
            return Err(CodecError::IncompleteData);
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Decodes CompactSize from the cursor.
    pub fn read_var_uint(&mut self) -> Result<u64, CodecError> {
        let b = self.read_u8()?;
        match b {
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            small => Ok(small as u64),
        }
    }

    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_var_uint()?;
        if len > MAX_VAR_BYTES {
            return Err(CodecError::LengthTooLarge(len));
        }
        self.read_bytes(len as usize)
    }

    /// Element count for a following array, capped at [`MAX_ARRAY_COUNT`].
    pub fn read_count(&mut self) -> Result<usize, CodecError> {
        let n = self.read_var_uint()?;
        if n > MAX_ARRAY_COUNT {
            return Err(CodecError::LengthTooLarge(n));
        }
        Ok(n as usize)
    }
}
