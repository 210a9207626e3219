//! Writable heap base: growth, offset bookkeeping, persistence.

use std::io::Write;

use mdpool_format::{Offset, align_up};

use crate::error::{PoolError, PoolResult};
use crate::read::{HeapRead, ReadHeap};
use crate::segment::Segment;
use crate::storage::ByteStorage;

/// Default growth increment for string heaps.
pub const STRING_HEAP_INCREMENT: u32 = 4096;
/// Default growth increment for GUID heaps.
pub const GUID_HEAP_INCREMENT: u32 = 256;
/// Default growth increment for blob heaps.
pub const BLOB_HEAP_INCREMENT: u32 = 4096;

/// Default persisted alignment.
pub const DEFAULT_ALIGN: u32 = 4;

/// Construction parameters shared by the heap base and the per-kind pools.
#[derive(Clone, Copy, Debug)]
pub struct HeapConfig {
    /// Extra bytes allocated beyond the requested size on every growth.
    pub increment: u32,
    /// Persisted streams are zero-padded to a multiple of this power of two.
    pub align: u32,
    /// Maintain the dedup index. Disable for read-through byte stores that
    /// only need sequential dumping; `rehash` turns it back on.
    pub dedup: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            increment: 4096,
            align: DEFAULT_ALIGN,
            dedup: true,
        }
    }
}

/// Append-only heap of chained segments.
///
/// Offsets already handed out are never invalidated: addressing is logical,
/// so growing the current segment or chaining a new one shifts no committed
/// entry. Only the final unsealed segment accepts appends.
#[derive(Debug)]
pub struct WriteHeap {
    segments: Vec<Segment>,
    /// Total committed bytes across all segments.
    used: u32,
    increment: u32,
    align: u32,
    edit_start: Option<u32>,
    frozen: bool,
}

impl WriteHeap {
    /// Empty heap with default growth and alignment.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Empty heap with explicit growth and alignment parameters.
    ///
    /// The `dedup` flag is consumed by the per-kind pools; the raw heap
    /// carries no index.
    pub fn with_config(cfg: HeapConfig) -> Self {
        Self {
            segments: Vec::new(),
            used: 0,
            increment: cfg.increment,
            align: cfg.align,
            edit_start: None,
            frozen: false,
        }
    }

    /// Offset at which the next append will land.
    pub fn end_offset(&self) -> Offset {
        Offset(self.used)
    }

    /// Configured persisted alignment.
    pub fn alignment(&self) -> u32 {
        self.align
    }

    /// Seal the heap to read-only. Terminal: appends fail from here on,
    /// reads and persistence still succeed.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Make sure the current segment can absorb `len` more bytes without
    /// further allocation, growing or opening a segment as needed.
    ///
    /// First allocation takes `len + increment` bytes; later growth
    /// reallocates the current segment to `used + len + increment`. A
    /// sealed current segment (after `chain_segment`) forces a fresh one.
    pub fn reserve(&mut self, len: usize) -> PoolResult<()> {
        if self.frozen {
            return Err(PoolError::Frozen);
        }
        let padded = len
            .checked_add(self.increment as usize)
            .ok_or(PoolError::Overflow)?;
        if self.segments.last().is_none_or(Segment::is_sealed) {
            self.segments.push(Segment::with_capacity(padded)?);
            return Ok(());
        }
        if let Some(cur) = self.segments.last_mut() {
            if len > cur.remaining() {
                cur.grow(padded)?;
            }
        }
        Ok(())
    }

    /// Append raw bytes, returning the offset at which they were placed.
    pub fn append(&mut self, bytes: &[u8]) -> PoolResult<Offset> {
        if self.frozen {
            return Err(PoolError::Frozen);
        }
        let len = u32::try_from(bytes.len()).map_err(|_| PoolError::Overflow)?;
        let offset = self.used;
        if len == 0 {
            return Ok(Offset(offset));
        }
        let new_used = offset.checked_add(len).ok_or(PoolError::Overflow)?;
        self.reserve(bytes.len())?;
        let cur = self
            .segments
            .last_mut()
            .expect("reserve leaves a writable segment");
        let ok = cur.append(bytes);
        debug_assert!(ok, "segment has room after reserve");
        self.used = new_used;
        Ok(Offset(offset))
    }

    /// Chain previously produced bytes as a sealed segment.
    ///
    /// Chained bytes are never appended to; later appends open a fresh
    /// segment after them. Entries inside them were not individually
    /// inserted here, so the owning pool must `rehash` before relying on
    /// dedup.
    pub fn chain_segment(&mut self, bytes: Vec<u8>) -> PoolResult<()> {
        if self.frozen {
            return Err(PoolError::Frozen);
        }
        let len = u32::try_from(bytes.len()).map_err(|_| PoolError::Overflow)?;
        let new_used = self.used.checked_add(len).ok_or(PoolError::Overflow)?;
        if !bytes.is_empty() {
            self.segments.push(Segment::from_bytes(bytes));
            self.used = new_used;
        }
        Ok(())
    }

    /// Bulk-import the suffix of another heap's committed bytes, starting
    /// at `from`.
    ///
    /// Raw byte copy only: duplicates between the two heaps are accepted
    /// and left for whichever component owns cross-pool dedup policy. The
    /// owning pool must `rehash` afterwards to index the imported entries.
    pub fn copy_from<H: HeapRead + ?Sized>(&mut self, source: &H, from: Offset) -> PoolResult<()> {
        if self.frozen {
            return Err(PoolError::Frozen);
        }
        if from.get() > source.data_len() {
            return Err(PoolError::OutOfRange { offset: from.get() });
        }
        let mut at = from.get();
        while at < source.data_len() {
            let chunk = source.get_raw(Offset(at))?;
            debug_assert!(!chunk.is_empty(), "raw_at yields a non-empty segment tail");
            self.append(chunk)?;
            at += chunk.len() as u32;
        }
        Ok(())
    }

    /// Record the current end of data as the edit boundary.
    ///
    /// Everything appended from here on belongs to the edit window and can
    /// be persisted separately. Idempotent: the first call wins.
    pub fn mark_edit_start(&mut self) {
        if self.edit_start.is_none() {
            self.edit_start = Some(self.used);
        }
    }

    /// Offset of the edit boundary, if one was marked.
    pub fn edit_start(&self) -> Option<Offset> {
        self.edit_start.map(Offset)
    }

    /// Total persisted size: used bytes across all segments, rounded up to
    /// the configured alignment.
    pub fn save_size(&self) -> PoolResult<u32> {
        align_up(self.used, self.align).ok_or(PoolError::Overflow)
    }

    /// Persisted size of the edit window; 0 when no boundary was marked.
    pub fn edit_save_size(&self) -> PoolResult<u32> {
        match self.edit_start {
            None => Ok(0),
            Some(start) => align_up(self.used - start, self.align).ok_or(PoolError::Overflow),
        }
    }

    /// Write every segment's used bytes in link order, zero-padded to the
    /// alignment boundary.
    ///
    /// Writes exactly `save_size()` bytes. Persistence is a pure read of
    /// committed state: a sink failure propagates unchanged and leaves the
    /// heap untouched.
    pub fn persist_to<W: Write>(&self, sink: &mut W) -> PoolResult<()> {
        for seg in &self.segments {
            sink.write_all(seg.as_slice())?;
        }
        self.write_padding(sink, self.used)
    }

    /// Write only the bytes from the edit boundary onward, zero-padded the
    /// same way. Writes exactly `edit_save_size()` bytes.
    pub fn persist_edit_to<W: Write>(&self, sink: &mut W) -> PoolResult<()> {
        let Some(start) = self.edit_start else {
            return Ok(());
        };
        let mut base = 0u32;
        for seg in &self.segments {
            let end = base + seg.used() as u32;
            if end > start {
                let skip = start.saturating_sub(base) as usize;
                sink.write_all(&seg.as_slice()[skip..])?;
            }
            base = end;
        }
        self.write_padding(sink, self.used - start)
    }

    fn write_padding<W: Write>(&self, sink: &mut W, written: u32) -> PoolResult<()> {
        const ZEROS: [u8; 64] = [0; 64];
        let aligned = align_up(written, self.align).ok_or(PoolError::Overflow)?;
        let mut pad = (aligned - written) as usize;
        while pad > 0 {
            let n = pad.min(ZEROS.len());
            sink.write_all(&ZEROS[..n])?;
            pad -= n;
        }
        Ok(())
    }

    /// Flatten the chain into a single-segment read-only heap for the
    /// in-process reading pass.
    ///
    /// Unpadded: the reader sees exactly the committed bytes.
    pub fn into_read(self) -> ReadHeap {
        let mut bytes = Vec::with_capacity(self.used as usize);
        for seg in &self.segments {
            bytes.extend_from_slice(seg.as_slice());
        }
        ReadHeap::from_storage(ByteStorage::from_vec(bytes))
    }

    /// Segments in link order, each with its base offset.
    pub(crate) fn segments(&self) -> impl Iterator<Item = (u32, &[u8])> {
        let mut base = 0u32;
        self.segments.iter().map(move |seg| {
            let b = base;
            base += seg.used() as u32;
            (b, seg.as_slice())
        })
    }
}

impl Default for WriteHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapRead for WriteHeap {
    fn data_len(&self) -> u32 {
        self.used
    }

    fn raw_at(&self, offset: u32) -> Option<&[u8]> {
        if offset == 0 && self.used == 0 {
            return Some(&[]);
        }
        if offset >= self.used {
            return None;
        }
        let mut base = 0u32;
        for seg in &self.segments {
            let end = base + seg.used() as u32;
            if offset < end {
                return Some(&seg.as_slice()[(offset - base) as usize..]);
            }
            base = end;
        }
        None
    }
}
