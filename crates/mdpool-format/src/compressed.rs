//! Variable-length unsigned length prefix.
//!
//! Big-endian continuation-bit encoding: 7 value bits per byte, most
//! significant group first, high bit set on every byte except the last.
//! Values below 0x80 take a single byte; any `u32` fits in 5 bytes.

use thiserror::Error;

/// Maximum number of bytes an encoded `u32` can occupy.
pub const MAX_ENCODED: usize = 5;

/// Length prefix decode error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LenError {
    /// The prefix ran past the end of the input.
    #[error("length prefix truncated after {0} bytes")]
    Truncated(usize),
    /// More than [`MAX_ENCODED`] prefix bytes, or a value beyond `u32`.
    #[error("length prefix exceeds {MAX_ENCODED} bytes")]
    Overlong,
}

/// Number of bytes [`write`] produces for `value`.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x001F_FFFF => 3,
        0x0020_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Append the encoded form of `value` to `out`.
pub fn write(out: &mut Vec<u8>, value: u32) {
    let n = encoded_len(value);
    for i in (0..n).rev() {
        let group = ((value >> (7 * i)) & 0x7F) as u8;
        if i == 0 {
            out.push(group);
        } else {
            out.push(group | 0x80);
        }
    }
}

/// Decode a length prefix from the start of `bytes`.
///
/// Returns the value and the number of prefix bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize), LenError> {
    let mut value: u64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if i == MAX_ENCODED {
            return Err(LenError::Overlong);
        }
        value = (value << 7) | u64::from(b & 0x7F);
        if b & 0x80 == 0 {
            let value = u32::try_from(value).map_err(|_| LenError::Overlong)?;
            return Ok((value, i + 1));
        }
    }
    Err(LenError::Truncated(bytes.len()))
}
