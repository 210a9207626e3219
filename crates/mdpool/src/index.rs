//! Dedup hash index: maps value bytes to existing heap offsets.

use std::fmt;
use std::hash::BuildHasher;

use hashbrown::{DefaultHashBuilder, HashTable};

/// Hash index over values resident in an owning pool.
///
/// Stores only the 32-bit offset/index word per entry. Equality during a
/// probe and rehashing during table growth re-read candidate bytes from
/// the pool through closures the pool supplies, so the index can never
/// disagree with pool content. No removal surface: the heaps are
/// append-only.
#[derive(Default)]
pub struct DedupIndex {
    table: HashTable<u32>,
    hasher: DefaultHashBuilder,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash the raw encoded bytes of a candidate value.
    pub fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        self.hasher.hash_one(bytes)
    }

    /// A clone of the hasher, for recomputing entry hashes outside a
    /// borrow of the index.
    pub fn hasher(&self) -> DefaultHashBuilder {
        self.hasher.clone()
    }

    /// Find the stored word whose pool bytes equal the probe value.
    pub fn find(&self, hash: u64, mut eq: impl FnMut(u32) -> bool) -> Option<u32> {
        self.table.find(hash, |&word| eq(word)).copied()
    }

    /// Register a new word under `hash`.
    ///
    /// `rehash` recomputes the hash of an already-stored word from pool
    /// bytes when the table grows; it must agree with the hash the word
    /// was registered under.
    pub fn insert(&mut self, hash: u64, word: u32, rehash: impl Fn(u32) -> u64) {
        self.table.insert_unique(hash, word, |&w| rehash(w));
    }

    /// Number of distinct indexed entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for DedupIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupIndex")
            .field("len", &self.table.len())
            .finish()
    }
}
