//! Human-readable heap listings for debugging.

use std::fmt::Write;

use mdpool_format::{GUID_SIZE, GuidIndex, Offset};

use crate::error::{PoolError, PoolResult};
use crate::read::{HeapRead, blob_span};

/// List every string entry with its offset.
///
/// Walks the committed bytes sequentially, so the listing doubles as a
/// heap integrity check: any malformed entry surfaces as the error a
/// reader would hit.
pub fn dump_strings<H: HeapRead + ?Sized>(heap: &H) -> PoolResult<String> {
    let mut out = String::new();
    writeln!(out, "[strings]").unwrap();
    let mut at = 0u32;
    while at < heap.data_len() {
        let s = heap.get_string(Offset(at))?;
        writeln!(out, "{at:#06x}  {s:?}").unwrap();
        at += s.len() as u32 + 1;
    }
    writeln!(out, "total = {} bytes", heap.data_len()).unwrap();
    Ok(out)
}

/// List every GUID entry with its 1-based index.
pub fn dump_guids<H: HeapRead + ?Sized>(heap: &H) -> PoolResult<String> {
    let mut out = String::new();
    writeln!(out, "[guids]").unwrap();
    let count = heap.data_len() / GUID_SIZE as u32;
    for n in 1..=count {
        let guid = heap.get_guid(GuidIndex(n))?;
        writeln!(out, "{n:>4}  {guid}").unwrap();
    }
    writeln!(out, "total = {} bytes", heap.data_len()).unwrap();
    Ok(out)
}

/// List every blob entry with its offset, payload length, and payload hex.
pub fn dump_blobs<H: HeapRead + ?Sized>(heap: &H) -> PoolResult<String> {
    let mut out = String::new();
    writeln!(out, "[blobs]").unwrap();
    let mut at = 0u32;
    while at < heap.data_len() {
        let entry = heap.get_raw(Offset(at))?;
        let (prefix, len) = blob_span(entry, at)?;
        let payload = entry
            .get(prefix..prefix + len as usize)
            .ok_or(PoolError::TruncatedBlob { offset: at })?;
        if payload.is_empty() {
            writeln!(out, "{at:#06x}  ({len} bytes)").unwrap();
        } else {
            writeln!(out, "{at:#06x}  ({len} bytes)  {}", hex(payload)).unwrap();
        }
        at += (prefix + len as usize) as u32;
    }
    writeln!(out, "total = {} bytes", heap.data_len()).unwrap();
    Ok(out)
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        write!(s, "{b:02x}").unwrap();
    }
    s
}
