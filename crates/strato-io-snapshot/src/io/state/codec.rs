//! Helpers for nested field payloads.
//!
//! All integers are little-endian. Variable-length byte strings are prefixed with a `u32` length.

use super::{SnapshotError, SnapshotResult};

#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.buf.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bool(self, v: bool) -> Self {
        self.u8(u8::from(v))
    }

    /// Raw bytes without a length prefix.
    pub fn bytes(mut self, v: &[u8]) -> Self {
        self.buf.extend_from_slice(v);
        self
    }

    /// Length-prefixed byte string.
    pub fn vec_u8(self, v: &[u8]) -> Self {
        self.u32(v.len() as u32).bytes(v)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn bytes(&mut self, len: usize) -> SnapshotResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(SnapshotError::UnexpectedEof);
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> SnapshotResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> SnapshotResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> SnapshotResult<u16> {
        self.array().map(u16::from_le_bytes)
    }

    pub fn u32(&mut self) -> SnapshotResult<u32> {
        self.array().map(u32::from_le_bytes)
    }

    pub fn i32(&mut self) -> SnapshotResult<i32> {
        self.array().map(i32::from_le_bytes)
    }

    pub fn u64(&mut self) -> SnapshotResult<u64> {
        self.array().map(u64::from_le_bytes)
    }

    pub fn bool(&mut self) -> SnapshotResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SnapshotError::InvalidFieldEncoding("invalid bool")),
        }
    }

    /// Reads a length-prefixed byte string, rejecting lengths above `max`.
    pub fn vec_u8(&mut self, max: usize) -> SnapshotResult<Vec<u8>> {
        let len = self.u32()? as usize;
        if len > max {
            return Err(SnapshotError::InvalidFieldEncoding("byte string too long"));
        }
        Ok(self.bytes(len)?.to_vec())
    }

    /// Fails if any input is left unconsumed.
    pub fn finish(self) -> SnapshotResult<()> {
        if self.remaining() != 0 {
            return Err(SnapshotError::InvalidFieldEncoding("trailing bytes"));
        }
        Ok(())
    }
}
