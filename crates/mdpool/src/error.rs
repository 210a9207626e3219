//! Pool error taxonomy.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Errors surfaced by heap pools.
///
/// The malformed-data variants (`MissingTerminator`, `InvalidUtf8`,
/// `TruncatedBlob`, `TruncatedGuid`, `InvalidLength`) are only reachable
/// when reading untrusted bytes through the read-only surface; a pool never
/// writes such data itself.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Offset is not 0 and not strictly inside the committed range.
    #[error("offset {offset:#x} is outside the committed range")]
    OutOfRange { offset: u32 },
    /// GUID index does not resolve to 16 committed bytes.
    #[error("GUID index {index} is outside the committed range")]
    IndexOutOfRange { index: u32 },
    /// String entry runs to the end of its segment without a zero byte.
    #[error("string at offset {offset:#x} has no zero terminator")]
    MissingTerminator { offset: u32 },
    /// String entry holds bytes that are not valid UTF-8.
    #[error("string at offset {offset:#x} is not valid UTF-8")]
    InvalidUtf8 { offset: u32 },
    /// String passed to insert contains an interior NUL byte, which the
    /// null-terminated layout cannot represent.
    #[error("string contains an interior NUL byte")]
    InteriorNul,
    /// Blob length prefix or payload runs past the end of its segment.
    #[error("blob at offset {offset:#x} is truncated")]
    TruncatedBlob { offset: u32 },
    /// Blob length prefix is not a well-formed compressed integer.
    #[error("blob at offset {offset:#x} has a malformed length prefix")]
    InvalidLength { offset: u32 },
    /// GUID heap length is not a multiple of 16.
    #[error("GUID entry at offset {offset:#x} is truncated")]
    TruncatedGuid { offset: u32 },
    /// Aligned size or offset arithmetic exceeds the addressable range.
    #[error("heap size exceeds the addressable range")]
    Overflow,
    /// Allocation failed while growing the heap.
    #[error("allocation failed while growing the heap")]
    OutOfMemory,
    /// Mutation attempted on a pool sealed to read-only.
    #[error("pool is frozen to read-only")]
    Frozen,
    /// Propagated unchanged from the injected persistence sink.
    #[error("sink error: {0}")]
    Io(#[from] io::Error),
}

impl From<TryReserveError> for PoolError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
