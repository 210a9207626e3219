//! Read-only heap surface.
//!
//! Reading is pure and index-free: every accessor re-resolves its offset
//! against current storage, scans or decodes the entry in place, and never
//! touches the dedup index. The same surface serves trusted in-process
//! heaps and untrusted mapped input, so every accessor validates.

use std::path::Path;
use std::str;

use mdpool_format::{GUID_SIZE, Guid, GuidIndex, LenError, Offset, compressed};

use crate::error::{PoolError, PoolResult};
use crate::storage::ByteStorage;

/// Read access to a heap's committed bytes.
///
/// Implemented by the borrow-only [`HeapView`], the owning [`ReadHeap`],
/// the writable heap, and the per-kind pools. Offsets are byte positions
/// in the logical stream; implementations only supply the raw resolution,
/// the typed accessors are shared.
pub trait HeapRead {
    /// Total committed bytes.
    fn data_len(&self) -> u32;

    /// Raw bytes from `offset` to the end of its containing segment, or
    /// `None` when the offset is outside the committed range.
    fn raw_at(&self, offset: u32) -> Option<&[u8]>;

    /// True iff `offset` is 0 or strictly inside the committed range.
    fn validate_offset(&self, offset: Offset) -> bool {
        offset.is_nil() || offset.get() < self.data_len()
    }

    /// Raw bytes from `offset` to the end of the containing segment.
    ///
    /// Callers that know the entry encoding determine the true end
    /// themselves; this accessor does not parse payloads.
    fn get_raw(&self, offset: Offset) -> PoolResult<&[u8]> {
        self.raw_at(offset.get()).ok_or(PoolError::OutOfRange {
            offset: offset.get(),
        })
    }

    /// Null-terminated UTF-8 string at `offset`.
    ///
    /// Offset 0 is the reserved empty string and never touches storage.
    fn get_string(&self, offset: Offset) -> PoolResult<&str> {
        if offset.is_nil() {
            return Ok("");
        }
        string_at(self.get_raw(offset)?, offset.get())
    }

    /// Length-prefixed blob payload at `offset`.
    ///
    /// Offset 0 is the reserved zero-length blob and never touches storage.
    fn get_blob(&self, offset: Offset) -> PoolResult<&[u8]> {
        if offset.is_nil() {
            return Ok(&[]);
        }
        let bytes = self.get_raw(offset)?;
        let (prefix, len) = blob_span(bytes, offset.get())?;
        let end = prefix
            .checked_add(len as usize)
            .ok_or(PoolError::TruncatedBlob {
                offset: offset.get(),
            })?;
        bytes.get(prefix..end).ok_or(PoolError::TruncatedBlob {
            offset: offset.get(),
        })
    }

    /// GUID at the 1-based `index`.
    ///
    /// Index 0 is the reserved all-zero GUID and never touches storage.
    fn get_guid(&self, index: GuidIndex) -> PoolResult<Guid> {
        if index.is_nil() {
            return Ok(Guid::ZERO);
        }
        let start = index
            .byte_offset()
            .ok_or(PoolError::IndexOutOfRange { index: index.get() })?;
        let end = start
            .checked_add(GUID_SIZE as u32)
            .ok_or(PoolError::IndexOutOfRange { index: index.get() })?;
        if end > self.data_len() {
            return Err(PoolError::IndexOutOfRange { index: index.get() });
        }
        let bytes = self
            .raw_at(start)
            .ok_or(PoolError::IndexOutOfRange { index: index.get() })?;
        // Entries never span segments; a shorter tail means the chain was
        // assembled from bytes that were not 16-byte entries.
        let raw: [u8; GUID_SIZE] = bytes
            .get(..GUID_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(PoolError::TruncatedGuid { offset: start })?;
        Ok(Guid::from_bytes(raw))
    }
}

/// Scan the null-terminated string starting at the head of `bytes`.
pub(crate) fn string_at(bytes: &[u8], offset: u32) -> PoolResult<&str> {
    let end = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or(PoolError::MissingTerminator { offset })?;
    str::from_utf8(&bytes[..end]).map_err(|_| PoolError::InvalidUtf8 { offset })
}

/// Decode the blob length prefix at the head of `bytes`.
///
/// Returns `(prefix_bytes, payload_len)`.
pub(crate) fn blob_span(bytes: &[u8], offset: u32) -> PoolResult<(usize, u32)> {
    match compressed::decode(bytes) {
        Ok((len, prefix)) => Ok((prefix, len)),
        Err(LenError::Truncated(_)) => Err(PoolError::TruncatedBlob { offset }),
        Err(LenError::Overlong) => Err(PoolError::InvalidLength { offset }),
    }
}

/// Borrow-only heap view over externally owned, immutable bytes.
///
/// The caller asserts the bytes are a finished heap stream and keeps them
/// alive for the view's lifetime; the view never copies them.
#[derive(Clone, Copy, Debug)]
pub struct HeapView<'a> {
    bytes: &'a [u8],
}

impl<'a> HeapView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(u32::try_from(bytes.len()).is_ok(), "heap exceeds u32 range");
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl HeapRead for HeapView<'_> {
    fn data_len(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn raw_at(&self, offset: u32) -> Option<&[u8]> {
        if offset == 0 || (offset as usize) < self.bytes.len() {
            self.bytes.get(offset as usize..)
        } else {
            None
        }
    }
}

/// Owning read-only heap over a single segment of finished bytes.
///
/// No hash index is carried or reconstructed; reading is sequential
/// offset resolution only.
#[derive(Debug)]
pub struct ReadHeap {
    storage: ByteStorage,
}

impl ReadHeap {
    /// Wrap finished heap bytes.
    pub fn from_vec(bytes: Vec<u8>) -> PoolResult<Self> {
        if u32::try_from(bytes.len()).is_err() {
            return Err(PoolError::Overflow);
        }
        Ok(Self {
            storage: ByteStorage::from_vec(bytes),
        })
    }

    /// Map a finished heap file read-only.
    pub fn open(path: impl AsRef<Path>) -> PoolResult<Self> {
        let storage = ByteStorage::from_file(path)?;
        if u32::try_from(storage.len()).is_err() {
            return Err(PoolError::Overflow);
        }
        Ok(Self { storage })
    }

    pub(crate) fn from_storage(storage: ByteStorage) -> Self {
        debug_assert!(u32::try_from(storage.len()).is_ok());
        Self { storage }
    }

    pub fn view(&self) -> HeapView<'_> {
        HeapView::new(&self.storage)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl HeapRead for ReadHeap {
    fn data_len(&self) -> u32 {
        self.storage.len() as u32
    }

    fn raw_at(&self, offset: u32) -> Option<&[u8]> {
        let bytes: &[u8] = &self.storage;
        if offset == 0 || (offset as usize) < bytes.len() {
            bytes.get(offset as usize..)
        } else {
            None
        }
    }
}
