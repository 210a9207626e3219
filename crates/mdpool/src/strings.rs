//! Deduplicating string heap pool.

use std::hash::BuildHasher;
use std::io::Write;
use std::str;

use mdpool_format::Offset;

use crate::error::{PoolError, PoolResult};
use crate::index::DedupIndex;
use crate::read::{HeapRead, ReadHeap};
use crate::write::{HeapConfig, STRING_HEAP_INCREMENT, WriteHeap};

/// Deduplicating pool of null-terminated UTF-8 strings.
///
/// Offset 0 is the reserved empty string, physically present as a single
/// zero byte at the start of the heap. Inserting a string that is already
/// present returns the offset of the first insertion; the index compares
/// against pool-resident bytes, never a cached copy.
#[derive(Debug)]
pub struct StringPool {
    heap: WriteHeap,
    index: Option<DedupIndex>,
}

impl StringPool {
    /// Empty pool with the default string-heap growth increment.
    pub fn new() -> Self {
        Self::with_config(HeapConfig {
            increment: STRING_HEAP_INCREMENT,
            ..HeapConfig::default()
        })
    }

    /// Empty pool with explicit growth, alignment, and hashing parameters.
    pub fn with_config(cfg: HeapConfig) -> Self {
        let mut heap = WriteHeap::with_config(cfg);
        // Reserved empty string at offset 0.
        heap.append(&[0]).expect("fresh heap accepts one byte");
        Self {
            heap,
            index: cfg.dedup.then(DedupIndex::new),
        }
    }

    /// Reopen previously persisted string-heap bytes for appending.
    ///
    /// The bytes are chained as a sealed segment and the index is rebuilt
    /// by scanning them, so duplicates of pre-existing strings resolve to
    /// their original offsets.
    pub fn open(bytes: Vec<u8>) -> PoolResult<Self> {
        Self::open_with_config(
            bytes,
            HeapConfig {
                increment: STRING_HEAP_INCREMENT,
                ..HeapConfig::default()
            },
        )
    }

    pub fn open_with_config(bytes: Vec<u8>, cfg: HeapConfig) -> PoolResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::with_config(cfg));
        }
        let mut heap = WriteHeap::with_config(cfg);
        heap.chain_segment(bytes)?;
        let mut pool = Self { heap, index: None };
        if cfg.dedup {
            pool.rehash()?;
        }
        Ok(pool)
    }

    /// Insert a string, returning its offset.
    ///
    /// The empty string is the reserved offset 0 and touches neither
    /// storage nor the index. Strings with an interior NUL are rejected:
    /// the null-terminated layout would truncate them on read.
    pub fn insert(&mut self, s: &str) -> PoolResult<Offset> {
        if self.heap.is_frozen() {
            return Err(PoolError::Frozen);
        }
        if s.is_empty() {
            return Ok(Offset::NIL);
        }
        if s.as_bytes().contains(&0) {
            return Err(PoolError::InteriorNul);
        }
        if let Some(index) = &self.index {
            let heap = &self.heap;
            let hash = index.hash_bytes(s.as_bytes());
            if let Some(word) = index.find(hash, |w| entry_bytes(heap, w) == s.as_bytes()) {
                return Ok(Offset(word));
            }
        }
        // Reserve up front so the entry and its terminator land in one
        // segment even when the second append would have grown.
        self.heap.reserve(s.len() + 1)?;
        let offset = self.heap.append(s.as_bytes())?;
        self.heap.append(&[0])?;
        self.register(offset.get());
        Ok(offset)
    }

    /// Look up a string without inserting.
    ///
    /// Always `Some(Offset::NIL)` for the empty string; `None` when the
    /// pool carries no index (hashing disabled).
    pub fn find(&self, s: &str) -> Option<Offset> {
        if s.is_empty() {
            return Some(Offset::NIL);
        }
        let index = self.index.as_ref()?;
        let heap = &self.heap;
        let hash = index.hash_bytes(s.as_bytes());
        index
            .find(hash, |w| entry_bytes(heap, w) == s.as_bytes())
            .map(Offset)
    }

    /// String at `offset`.
    pub fn get(&self, offset: Offset) -> PoolResult<&str> {
        self.heap.get_string(offset)
    }

    /// Number of distinct strings indexed. The reserved empty string at
    /// offset 0 is not counted; 0 while hashing is disabled.
    pub fn entry_count(&self) -> usize {
        self.index.as_ref().map_or(0, DedupIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Rebuild the index by scanning all committed bytes.
    ///
    /// Required after `chain_segment`/`copy_from` bring in bytes that never
    /// went through `insert`, and after constructing with `dedup: false` to
    /// turn hashing on.
    pub fn rehash(&mut self) -> PoolResult<()> {
        let mut index = DedupIndex::new();
        let hasher = index.hasher();
        {
            let heap = &self.heap;
            for (base, bytes) in heap.segments() {
                let mut at = 0usize;
                while at < bytes.len() {
                    let offset = base + at as u32;
                    let Some(end) = bytes[at..].iter().position(|&b| b == 0) else {
                        return Err(PoolError::MissingTerminator { offset });
                    };
                    if end > 0 {
                        let entry = &bytes[at..at + end];
                        str::from_utf8(entry).map_err(|_| PoolError::InvalidUtf8 { offset })?;
                        let hash = hasher.hash_one(entry);
                        if index.find(hash, |w| entry_bytes(heap, w) == entry).is_none() {
                            index.insert(hash, offset, |w| hasher.hash_one(entry_bytes(heap, w)));
                        }
                    }
                    at += end + 1;
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
        let hash = hasher.hash_one(entry_bytes(heap, word));
        index.insert(hash, word, |w| hasher.hash_one(entry_bytes(heap, w)));
    }

    /// Chain previously produced string-heap bytes as a sealed segment.
    /// Call `rehash` before relying on dedup against them.
    pub fn chain_segment(&mut self, bytes: Vec<u8>) -> PoolResult<()> {
        self.heap.chain_segment(bytes)
    }

    /// Bulk-import another heap's bytes from `from` onward; raw copy, no
    /// dedup. Call `rehash` afterwards.
    pub fn copy_from<H: HeapRead + ?Sized>(&mut self, source: &H, from: Offset) -> PoolResult<()> {
        self.heap.copy_from(source, from)
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

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapRead for StringPool {
    fn data_len(&self) -> u32 {
        self.heap.data_len()
    }

    fn raw_at(&self, offset: u32) -> Option<&[u8]> {
        self.heap.raw_at(offset)
    }
}

/// Entry bytes (terminator excluded) for an offset the index registered.
fn entry_bytes(heap: &WriteHeap, word: u32) -> &[u8] {
    heap.get_string(Offset(word))
        .expect("index entry resolves to a written string")
        .as_bytes()
}
