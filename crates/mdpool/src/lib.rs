//! Deduplicating pool storage for the heaps of a binary metadata
//! container.
//!
//! Three pool kinds share one architecture: an append-only segmented heap
//! addressed by stable logical offsets, plus a hash index that maps value
//! bytes to the offset of their first insertion.
//!
//! - [`StringPool`]: null-terminated UTF-8 strings, addressed by byte
//!   offset. Offset 0 is the reserved empty string.
//! - [`GuidPool`]: raw 16-byte GUIDs, addressed by 1-based index. Index 0
//!   is the reserved all-zero GUID.
//! - [`BlobPool`]: length-prefixed byte blobs, addressed by byte offset.
//!   Offset 0 is the reserved empty blob.
//!
//! Writing and reading are separate surfaces. The pools build and persist
//! heap streams; [`ReadHeap`] and [`HeapView`] resolve offsets against
//! finished streams without carrying any index. The [`HeapRead`] trait is
//! the shared read surface, so a pool mid-construction answers the same
//! queries as a mapped file.

pub mod dump;

mod blobs;
mod error;
mod guids;
mod index;
mod read;
mod segment;
mod storage;
mod strings;
mod write;

#[cfg(test)]
mod blobs_tests;
#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod write_tests;

pub use blobs::BlobPool;
pub use error::{PoolError, PoolResult};
pub use guids::GuidPool;
pub use read::{HeapRead, HeapView, ReadHeap};
pub use strings::StringPool;
pub use write::{
    BLOB_HEAP_INCREMENT, DEFAULT_ALIGN, GUID_HEAP_INCREMENT, HeapConfig, STRING_HEAP_INCREMENT,
    WriteHeap,
};

pub use mdpool_format::{GUID_SIZE, Guid, GuidIndex, Offset};
