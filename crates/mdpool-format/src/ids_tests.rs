//! Tests for the handle newtypes.

use super::ids::{GUID_SIZE, GuidIndex, Offset};

#[test]
fn offset_nil_is_zero() {
    assert!(Offset::NIL.is_nil());
    assert_eq!(Offset::NIL.get(), 0);
    assert!(!Offset(1).is_nil());
}

#[test]
fn guid_index_zero_has_no_offset() {
    assert!(GuidIndex::NIL.is_nil());
    assert_eq!(GuidIndex::NIL.byte_offset(), None);
}

#[test]
fn guid_index_offset_round_trip() {
    for n in [1u32, 2, 3, 100] {
        let ix = GuidIndex(n);
        let off = ix.byte_offset().unwrap();
        assert_eq!(off, (n - 1) * GUID_SIZE as u32);
        assert_eq!(GuidIndex::from_byte_offset(off), ix);
    }
}

#[test]
fn guid_index_offset_overflow_is_none() {
    assert_eq!(GuidIndex(u32::MAX).byte_offset(), None);
}
