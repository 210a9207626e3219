use std::io::{self, Write};

use mdpool_format::Offset;

use crate::read::HeapRead;
use crate::write::{HeapConfig, WriteHeap};

fn tiny_heap() -> WriteHeap {
    // Increment of 1 forces a growth or a fresh segment on almost every
    // append, which is the interesting regime for offset stability.
    WriteHeap::with_config(HeapConfig {
        increment: 1,
        ..HeapConfig::default()
    })
}

/// Sink that fails after a fixed number of bytes.
struct FailingSink {
    remaining: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.remaining {
            return Err(io::Error::other("sink full"));
        }
        self.remaining -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn appends_are_contiguous() {
    let mut heap = WriteHeap::new();

    assert_eq!(heap.append(b"abc").unwrap(), Offset(0));
    assert_eq!(heap.append(b"de").unwrap(), Offset(3));
    assert_eq!(heap.end_offset(), Offset(5));
    assert_eq!(heap.data_len(), 5);
}

#[test]
fn offsets_survive_growth() {
    let mut heap = tiny_heap();

    let mut offsets = Vec::new();
    for i in 0..100u32 {
        let entry = format!("entry-{i}");
        offsets.push((heap.append(entry.as_bytes()).unwrap(), entry));
    }

    for (offset, entry) in &offsets {
        let raw = heap.get_raw(*offset).unwrap();
        assert_eq!(&raw[..entry.len()], entry.as_bytes());
    }
}

#[test]
fn empty_append_returns_current_end() {
    let mut heap = WriteHeap::new();
    heap.append(b"ab").unwrap();

    assert_eq!(heap.append(&[]).unwrap(), Offset(2));
    assert_eq!(heap.data_len(), 2);
}

#[test]
fn chain_segment_extends_the_offset_space() {
    let mut heap = WriteHeap::new();
    heap.append(b"head").unwrap();

    heap.chain_segment(b"chained".to_vec()).unwrap();
    let after = heap.append(b"tail").unwrap();

    assert_eq!(after, Offset(11));
    assert_eq!(heap.get_raw(Offset(4)).unwrap(), b"chained");
    assert_eq!(heap.get_raw(Offset(11)).unwrap(), b"tail");
}

#[test]
fn chain_empty_segment_is_a_no_op() {
    let mut heap = WriteHeap::new();
    heap.chain_segment(Vec::new()).unwrap();

    assert_eq!(heap.data_len(), 0);
}

#[test]
fn save_size_rounds_up_to_alignment() {
    let mut heap = WriteHeap::new();
    heap.append(&[0u8; 9]).unwrap();

    assert_eq!(heap.save_size().unwrap(), 12);
}

#[test]
fn save_size_of_empty_heap_is_zero() {
    let heap = WriteHeap::new();
    assert_eq!(heap.save_size().unwrap(), 0);
}

#[test]
fn persist_writes_exactly_save_size() {
    let mut heap = tiny_heap();
    heap.append(b"abc").unwrap();
    heap.append(b"defghi").unwrap();

    let mut out = Vec::new();
    heap.persist_to(&mut out).unwrap();

    assert_eq!(heap.save_size().unwrap(), 12);
    assert_eq!(out.len(), 12);
    assert_eq!(&out[..9], b"abcdefghi");
    assert_eq!(&out[9..], &[0, 0, 0]);
}

#[test]
fn persist_spans_chained_segments() {
    let mut heap = WriteHeap::new();
    heap.append(b"one-").unwrap();
    heap.chain_segment(b"two-".to_vec()).unwrap();
    heap.append(b"tree").unwrap();

    let mut out = Vec::new();
    heap.persist_to(&mut out).unwrap();

    assert_eq!(out, b"one-two-tree");
}

#[test]
fn edit_window_starts_empty_and_tracks_appends() {
    let mut heap = WriteHeap::new();
    heap.append(b"base").unwrap();

    assert_eq!(heap.edit_save_size().unwrap(), 0);

    heap.mark_edit_start();
    assert_eq!(heap.edit_save_size().unwrap(), 0);

    heap.append(b"delta").unwrap();
    assert_eq!(heap.edit_save_size().unwrap(), 8);

    let mut out = Vec::new();
    heap.persist_edit_to(&mut out).unwrap();
    assert_eq!(out, b"delta\0\0\0");
}

#[test]
fn mark_edit_start_is_idempotent() {
    let mut heap = WriteHeap::new();
    heap.append(b"base").unwrap();
    heap.mark_edit_start();
    heap.append(b"more").unwrap();

    // A second mark must not move the boundary.
    heap.mark_edit_start();

    assert_eq!(heap.edit_start(), Some(Offset(4)));
    assert_eq!(heap.edit_save_size().unwrap(), 4);
}

#[test]
fn edit_window_spans_segment_boundaries() {
    let mut heap = tiny_heap();
    heap.append(b"aa").unwrap();
    heap.mark_edit_start();
    heap.append(b"bb").unwrap();
    heap.chain_segment(b"cc".to_vec()).unwrap();
    heap.append(b"dd").unwrap();

    let mut out = Vec::new();
    heap.persist_edit_to(&mut out).unwrap();

    assert_eq!(&out[..6], b"bbccdd");
}

#[test]
fn frozen_heap_rejects_mutation_but_still_reads() {
    let mut heap = WriteHeap::new();
    heap.append(b"data").unwrap();

    heap.freeze();

    assert!(heap.is_frozen());
    assert!(matches!(
        heap.append(b"x"),
        Err(crate::PoolError::Frozen)
    ));
    assert!(matches!(
        heap.chain_segment(b"x".to_vec()),
        Err(crate::PoolError::Frozen)
    ));

    assert_eq!(heap.get_raw(Offset(0)).unwrap(), b"data");
    let mut out = Vec::new();
    heap.persist_to(&mut out).unwrap();
    assert_eq!(out, b"data");
}

#[test]
fn sink_failure_propagates() {
    let mut heap = WriteHeap::new();
    heap.append(&[7u8; 32]).unwrap();

    let mut sink = FailingSink { remaining: 8 };
    assert!(matches!(
        heap.persist_to(&mut sink),
        Err(crate::PoolError::Io(_))
    ));
}

#[test]
fn copy_from_imports_the_source_suffix() {
    let mut source = tiny_heap();
    source.append(b"skip-").unwrap();
    source.append(b"keep-this").unwrap();

    let mut dest = WriteHeap::new();
    dest.copy_from(&source, Offset(5)).unwrap();

    assert_eq!(dest.data_len(), 9);
    assert_eq!(dest.get_raw(Offset(0)).unwrap(), b"keep-this");
}

#[test]
fn copy_from_past_the_end_is_rejected() {
    let mut source = WriteHeap::new();
    source.append(b"ab").unwrap();

    let mut dest = WriteHeap::new();
    assert!(matches!(
        dest.copy_from(&source, Offset(3)),
        Err(crate::PoolError::OutOfRange { offset: 3 })
    ));
}

#[test]
fn into_read_flattens_the_chain() {
    let mut heap = tiny_heap();
    heap.append(b"abc").unwrap();
    heap.chain_segment(b"def".to_vec()).unwrap();
    heap.append(b"ghi").unwrap();

    let read = heap.into_read();

    assert_eq!(read.as_bytes(), b"abcdefghi");
}
