//! Deduplicating GUID heap pool.

use std::hash::BuildHasher;
use std::io::Write;

use mdpool_format::{GUID_SIZE, Guid, GuidIndex, Offset};

use crate::error::{PoolError, PoolResult};
use crate::index::DedupIndex;
use crate::read::{HeapRead, ReadHeap};
use crate::write::{GUID_HEAP_INCREMENT, HeapConfig, WriteHeap};

/// Deduplicating pool of 16-byte GUIDs.
///
/// The externally visible handle is a 1-based index, not a byte offset:
/// entry `n` occupies bytes `(n-1)*16 .. n*16`. Index 0 is the reserved
/// all-zero GUID and is never physically stored, so the heap needs no
/// null-termination convention and no reserved leading byte.
#[derive(Debug)]
pub struct GuidPool {
    heap: WriteHeap,
    index: Option<DedupIndex>,
}

impl GuidPool {
    /// Empty pool with the default GUID-heap growth increment.
    pub fn new() -> Self {
        Self::with_config(HeapConfig {
            increment: GUID_HEAP_INCREMENT,
            ..HeapConfig::default()
        })
    }

    /// Empty pool with explicit growth, alignment, and hashing parameters.
    pub fn with_config(cfg: HeapConfig) -> Self {
        Self {
            heap: WriteHeap::with_config(cfg),
            index: cfg.dedup.then(DedupIndex::new),
        }
    }

    /// Reopen previously persisted GUID-heap bytes for appending.
    ///
    /// Fails with `TruncatedGuid` when the length is not a multiple of 16.
    pub fn open(bytes: Vec<u8>) -> PoolResult<Self> {
        Self::open_with_config(
            bytes,
            HeapConfig {
                increment: GUID_HEAP_INCREMENT,
                ..HeapConfig::default()
            },
        )
    }

    pub fn open_with_config(bytes: Vec<u8>, cfg: HeapConfig) -> PoolResult<Self> {
        if bytes.len() % GUID_SIZE != 0 {
            return Err(PoolError::TruncatedGuid {
                offset: (bytes.len() - bytes.len() % GUID_SIZE) as u32,
            });
        }
        let mut heap = WriteHeap::with_config(cfg);
        heap.chain_segment(bytes)?;
        let mut pool = Self { heap, index: None };
        if cfg.dedup {
            pool.rehash()?;
        }
        Ok(pool)
    }

    /// Insert a GUID, returning its 1-based index.
    ///
    /// The all-zero GUID is the reserved index 0 and touches neither
    /// storage nor the index.
    pub fn insert(&mut self, guid: Guid) -> PoolResult<GuidIndex> {
        if self.heap.is_frozen() {
            return Err(PoolError::Frozen);
        }
        if guid.is_zero() {
            return Ok(GuidIndex::NIL);
        }
        if let Some(index) = &self.index {
            let heap = &self.heap;
            let hash = index.hash_bytes(guid.as_bytes());
            if let Some(word) = index.find(hash, |w| entry_guid(heap, w) == guid) {
                return Ok(GuidIndex(word));
            }
        }
        let offset = self.heap.append(guid.as_bytes())?;
        let ix = GuidIndex::from_byte_offset(offset.get());
        self.register(ix.get());
        Ok(ix)
    }

    /// Look up a GUID without inserting.
    ///
    /// Always `Some(GuidIndex::NIL)` for the zero GUID; `None` when the
    /// pool carries no index (hashing disabled).
    pub fn find(&self, guid: Guid) -> Option<GuidIndex> {
        if guid.is_zero() {
            return Some(GuidIndex::NIL);
        }
        let index = self.index.as_ref()?;
        let heap = &self.heap;
        let hash = index.hash_bytes(guid.as_bytes());
        index
            .find(hash, |w| entry_guid(heap, w) == guid)
            .map(GuidIndex)
    }

    /// GUID at the 1-based `index`.
    pub fn get(&self, index: GuidIndex) -> PoolResult<Guid> {
        self.heap.get_guid(index)
    }

    /// Number of distinct GUIDs indexed. The reserved zero GUID is not
    /// counted; 0 while hashing is disabled.
    pub fn entry_count(&self) -> usize {
        self.index.as_ref().map_or(0, DedupIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Rebuild the index by scanning all committed 16-byte entries.
    pub fn rehash(&mut self) -> PoolResult<()> {
        let mut index = DedupIndex::new();
        let hasher = index.hasher();
        {
            let heap = &self.heap;
            for (base, bytes) in heap.segments() {
                let mut at = 0usize;
                while at < bytes.len() {
                    let offset = base + at as u32;
                    let Some(entry) = bytes.get(at..at + GUID_SIZE) else {
                        return Err(PoolError::TruncatedGuid { offset });
                    };
                    let word = GuidIndex::from_byte_offset(offset).get();
                    let hash = hasher.hash_one(entry);
                    if index.find(hash, |w| entry_slice(heap, w) == entry).is_none() {
                        index.insert(hash, word, |w| hasher.hash_one(entry_slice(heap, w)));
                    }
                    at += GUID_SIZE;
                }
            }
        }
        self.index = Some(index);
        Ok(())
    }

    fn register(&mut self, word: u32) {
        let Some(index) = &mut self.index else {
            return;
        };
        let heap = &self.heap;
        let hasher = index.hasher();
        let hash = hasher.hash_one(entry_slice(heap, word));
        index.insert(hash, word, |w| hasher.hash_one(entry_slice(heap, w)));
    }

    /// Chain previously persisted GUID-heap bytes as a sealed segment.
    /// Call `rehash` before relying on dedup against them.
    ///
    /// Fails with `TruncatedGuid` when the length is not a multiple of 16;
    /// a ragged chain would misalign every later index.
    pub fn chain_segment(&mut self, bytes: Vec<u8>) -> PoolResult<()> {
        if bytes.len() % GUID_SIZE != 0 {
            let tail = (bytes.len() - bytes.len() % GUID_SIZE) as u32;
            return Err(PoolError::TruncatedGuid {
                offset: self.heap.data_len().saturating_add(tail),
            });
        }
        self.heap.chain_segment(bytes)
    }

    /// Bulk-import another heap's bytes starting at the entry `from`
    /// names; raw copy, no dedup. Call `rehash` afterwards.
    pub fn copy_from<H: HeapRead + ?Sized>(
        &mut self,
        source: &H,
        from: GuidIndex,
    ) -> PoolResult<()> {
        let offset = match from.byte_offset() {
            Some(off) => off,
            None if from.is_nil() => 0,
            None => return Err(PoolError::IndexOutOfRange { index: from.get() }),
        };
        self.heap.copy_from(source, Offset(offset))
    }

    /// Record the edit boundary at the current end of data. Idempotent.
    pub fn mark_edit_start(&mut self) {
        self.heap.mark_edit_start();
    }

    pub fn save_size(&self) -> PoolResult<u32> {
        self.heap.save_size()
    }

    pub fn edit_save_size(&self) -> PoolResult<u32> {
        self.heap.edit_save_size()
    }

    pub fn persist_to<W: Write>(&self, sink: &mut W) -> PoolResult<()> {
        self.heap.persist_to(sink)
    }

    pub fn persist_edit_to<W: Write>(&self, sink: &mut W) -> PoolResult<()> {
        self.heap.persist_edit_to(sink)
    }

    /// Seal the pool to read-only. Terminal.
    pub fn freeze(&mut self) {
        self.heap.freeze();
    }

    pub fn is_frozen(&self) -> bool {
        self.heap.is_frozen()
    }

    /// Flatten into a read-only heap for a reading pass in this process.
    pub fn into_read(self) -> ReadHeap {
        self.heap.into_read()
    }
}

impl Default for GuidPool {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapRead for GuidPool {
    fn data_len(&self) -> u32 {
        self.heap.data_len()
    }

    fn raw_at(&self, offset: u32) -> Option<&[u8]> {
        self.heap.raw_at(offset)
    }
}

/// GUID value for an index word the dedup index registered.
fn entry_guid(heap: &WriteHeap, word: u32) -> Guid {
    heap.get_guid(GuidIndex(word))
        .expect("index entry resolves to a written GUID")
}

/// Raw 16 bytes for an index word the dedup index registered.
fn entry_slice(heap: &WriteHeap, word: u32) -> &[u8] {
    let offset = GuidIndex(word)
        .byte_offset()
        .expect("index never stores the reserved zero GUID");
    let raw = heap
        .raw_at(offset)
        .expect("index entry resolves to written bytes");
    &raw[..GUID_SIZE]
}
