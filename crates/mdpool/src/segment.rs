//! Segment primitive: one contiguous run of heap bytes.

use crate::error::PoolResult;

/// One contiguous chunk of a heap's backing storage.
///
/// A heap is the ordered chain of its segments. Sealed segments hold
/// previously produced bytes and never accept appends; only the final,
/// unsealed segment of a chain grows. Segments are never removed.
#[derive(Debug)]
pub struct Segment {
    buf: Vec<u8>,
    sealed: bool,
}

impl Segment {
    /// Allocate an empty growable segment.
    pub fn with_capacity(cap: usize) -> PoolResult<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(cap)?;
        Ok(Self { buf, sealed: false })
    }

    /// Wrap previously produced bytes as a sealed segment.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buf: bytes,
            sealed: true,
        }
    }

    /// Bytes currently committed to this segment.
    pub fn used(&self) -> usize {
        self.buf.len()
    }

    /// Declared capacity.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Room left before the segment would have to grow.
    pub fn remaining(&self) -> usize {
        self.buf.capacity() - self.buf.len()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Copy `bytes` in place. Returns false without writing when the
    /// segment is sealed or the bytes would exceed its capacity.
    pub fn append(&mut self, bytes: &[u8]) -> bool {
        if self.sealed || bytes.len() > self.remaining() {
            return false;
        }
        self.buf.extend_from_slice(bytes);
        true
    }

    /// Reserve room for `additional` more bytes.
    ///
    /// Reallocation moves the backing bytes but never the logical offsets
    /// committed against them.
    pub fn grow(&mut self, additional: usize) -> PoolResult<()> {
        debug_assert!(!self.sealed, "sealed segments never grow");
        self.buf.try_reserve_exact(additional)?;
        Ok(())
    }
}
