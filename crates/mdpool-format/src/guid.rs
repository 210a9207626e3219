//! 16-byte GUID value type.

use std::fmt;

use crate::ids::GUID_SIZE;

/// A raw 16-byte GUID.
///
/// The heap stores GUIDs as opaque bytes; no RFC 4122 field interpretation
/// is applied beyond the hyphenated display form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; GUID_SIZE]);

impl Guid {
    /// The reserved all-zero GUID (index 0, never physically stored).
    pub const ZERO: Self = Self([0; GUID_SIZE]);

    #[inline]
    pub fn from_bytes(bytes: [u8; GUID_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; GUID_SIZE] {
        &self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; GUID_SIZE]
    }
}

impl From<[u8; GUID_SIZE]> for Guid {
    fn from(bytes: [u8; GUID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0],
            b[1],
            b[2],
            b[3],
            b[4],
            b[5],
            b[6],
            b[7],
            b[8],
            b[9],
            b[10],
            b[11],
            b[12],
            b[13],
            b[14],
            b[15],
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}
