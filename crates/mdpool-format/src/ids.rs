//! Heap handle newtypes.

/// Number of bytes occupied by one GUID entry.
pub const GUID_SIZE: usize = 16;

/// Zero-based byte position within a heap's logical byte stream.
///
/// Offsets are handles, not pointers: every accessor re-resolves the offset
/// against current storage, so segment reallocation never invalidates one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Offset(pub u32);

impl Offset {
    /// Reserved offset of the canonical empty value.
    pub const NIL: Self = Self(0);

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        self.0 == 0
    }
}

/// One-based GUID entry number; 0 denotes the reserved all-zero GUID,
/// which is never physically stored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct GuidIndex(pub u32);

impl GuidIndex {
    /// Reserved index of the all-zero GUID.
    pub const NIL: Self = Self(0);

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        self.0 == 0
    }

    /// Byte offset of this entry within the GUID heap.
    ///
    /// `None` for index 0 (nothing stored) and for indices whose offset
    /// does not fit in `u32`.
    #[inline]
    pub fn byte_offset(self) -> Option<u32> {
        let n = self.0.checked_sub(1)?;
        n.checked_mul(GUID_SIZE as u32)
    }

    /// Index of the entry that starts at `offset`.
    #[inline]
    pub fn from_byte_offset(offset: u32) -> Self {
        Self(offset / GUID_SIZE as u32 + 1)
    }
}
