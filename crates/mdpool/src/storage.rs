//! Backing storage for read-only heaps.

use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

/// Bytes backing a read-only heap: owned in memory or mapped from a
/// finished file.
#[derive(Debug)]
pub enum ByteStorage {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl ByteStorage {
    /// Wrap owned bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::Owned(bytes)
    }

    /// Map a finished heap file read-only.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and the caller asserts the file
        // is finished and immutable for the life of the heap.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(map))
    }
}

impl Deref for ByteStorage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Mapped(map) => map,
        }
    }
}
