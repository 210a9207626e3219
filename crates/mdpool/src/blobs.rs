//! Deduplicating blob heap pool.

use std::hash::BuildHasher;
use std::io::Write;

use mdpool_format::{Offset, compressed};

use crate::error::{PoolError, PoolResult};
use crate::index::DedupIndex;
use crate::read::{HeapRead, ReadHeap, blob_span};
use crate::write::{BLOB_HEAP_INCREMENT, HeapConfig, WriteHeap};

/// Deduplicating pool of length-prefixed byte blobs.
///
/// Each entry is a 1-5 byte big-endian length prefix followed by the
/// payload. Offset 0 is the reserved empty blob, physically present as a
/// single zero byte (a zero-length prefix) at the start of the heap.
/// Two blobs are duplicates iff their payloads are byte-identical; the
/// prefix encoding is canonical, so comparing encoded entries is
/// equivalent.
#[derive(Debug)]
pub struct BlobPool {
    heap: WriteHeap,
    index: Option<DedupIndex>,
}

impl BlobPool {
    /// Empty pool with the default blob-heap growth increment.
    pub fn new() -> Self {
        Self::with_config(HeapConfig {
            increment: BLOB_HEAP_INCREMENT,
            ..HeapConfig::default()
        })
    }

    /// Empty pool with explicit growth, alignment, and hashing parameters.
    pub fn with_config(cfg: HeapConfig) -> Self {
        let mut heap = WriteHeap::with_config(cfg);
        // Reserved empty blob at offset 0.
        heap.append(&[0]).expect("fresh heap accepts one byte");
        Self {
            heap,
            index: cfg.dedup.then(DedupIndex::new),
        }
    }

    /// Reopen previously persisted blob-heap bytes for appending.
    ///
    /// The bytes are chained as a sealed segment and the index is rebuilt
    /// by scanning them, so duplicates of pre-existing blobs resolve to
    /// their original offsets.
    pub fn open(bytes: Vec<u8>) -> PoolResult<Self> {
        Self::open_with_config(
            bytes,
            HeapConfig {
                increment: BLOB_HEAP_INCREMENT,
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

    /// Insert a blob, returning the offset of its length prefix.
    ///
    /// The empty blob is the reserved offset 0 and touches neither storage
    /// nor the index. The prefix and payload land in one append, so no
    /// partially written entry is ever observable.
    pub fn insert(&mut self, payload: &[u8]) -> PoolResult<Offset> {
        if self.heap.is_frozen() {
            return Err(PoolError::Frozen);
        }
        if payload.is_empty() {
            return Ok(Offset::NIL);
        }
        let len = u32::try_from(payload.len()).map_err(|_| PoolError::Overflow)?;
        let mut encoded = Vec::new();
        encoded.try_reserve_exact(compressed::encoded_len(len) + payload.len())?;
        compressed::write(&mut encoded, len);
        encoded.extend_from_slice(payload);
        if let Some(index) = &self.index {
            let heap = &self.heap;
            let hash = index.hash_bytes(&encoded);
            if let Some(word) = index.find(hash, |w| entry_encoded(heap, w) == encoded) {
                return Ok(Offset(word));
            }
        }
        let offset = self.heap.append(&encoded)?;
        self.register(offset.get());
        Ok(offset)
    }

    /// Look up a blob without inserting.
    ///
    /// Always `Some(Offset::NIL)` for the empty blob; `None` when the pool
    /// carries no index (hashing disabled).
    pub fn find(&self, payload: &[u8]) -> Option<Offset> {
        if payload.is_empty() {
            return Some(Offset::NIL);
        }
        let index = self.index.as_ref()?;
        let len = u32::try_from(payload.len()).ok()?;
        let mut encoded = Vec::new();
        encoded
            .try_reserve_exact(compressed::encoded_len(len) + payload.len())
            .ok()?;
        compressed::write(&mut encoded, len);
        encoded.extend_from_slice(payload);
        let heap = &self.heap;
        let hash = index.hash_bytes(&encoded);
        index
            .find(hash, |w| entry_encoded(heap, w) == encoded)
            .map(Offset)
    }

    /// Blob payload at `offset`.
    pub fn get(&self, offset: Offset) -> PoolResult<&[u8]> {
        self.heap.get_blob(offset)
    }

    /// Number of distinct blobs indexed. The reserved empty blob at
    /// offset 0 is not counted; 0 while hashing is disabled.
    pub fn entry_count(&self) -> usize {
        self.index.as_ref().map_or(0, DedupIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Rebuild the index by scanning all committed entries.
    pub fn rehash(&mut self) -> PoolResult<()> {
        let mut index = DedupIndex::new();
        let hasher = index.hasher();
        {
            let heap = &self.heap;
            for (base, bytes) in heap.segments() {
                let mut at = 0usize;
                while at < bytes.len() {
                    let offset = base + at as u32;
                    let (prefix, len) = blob_span(&bytes[at..], offset)?;
                    let end = at
                        .checked_add(prefix)
                        .and_then(|p| p.checked_add(len as usize))
                        .ok_or(PoolError::TruncatedBlob { offset })?;
                    let Some(entry) = bytes.get(at..end) else {
                        return Err(PoolError::TruncatedBlob { offset });
                    };
                    if len > 0 {
                        let hash = hasher.hash_one(entry);
                        if index
                            .find(hash, |w| entry_encoded(heap, w) == entry)
                            .is_none()
                        {
                            index.insert(hash, offset, |w| hasher.hash_one(entry_encoded(heap, w)));
                        }
                    }
                    at = end;
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
        let hash = hasher.hash_one(entry_encoded(heap, word));
        index.insert(hash, word, |w| hasher.hash_one(entry_encoded(heap, w)));
    }

    /// Chain previously produced blob-heap bytes as a sealed segment.
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

impl Default for BlobPool {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapRead for BlobPool {
    fn data_len(&self) -> u32 {
        self.heap.data_len()
    }

    fn raw_at(&self, offset: u32) -> Option<&[u8]> {
        self.heap.raw_at(offset)
    }
}

/// Encoded entry bytes (prefix and payload) for an offset the index
/// registered.
fn entry_encoded(heap: &WriteHeap, word: u32) -> &[u8] {
    let raw = heap
        .raw_at(word)
        .expect("index entry resolves to written bytes");
    let (prefix, len) = blob_span(raw, word).expect("index entry carries a valid length prefix");
    &raw[..prefix + len as usize]
}
