//! Tests for alignment arithmetic.

use super::align::align_up;

#[test]
fn already_aligned_values_are_unchanged() {
    assert_eq!(align_up(0, 4), Some(0));
    assert_eq!(align_up(8, 4), Some(8));
    assert_eq!(align_up(64, 64), Some(64));
}

#[test]
fn rounds_up_to_next_multiple() {
    assert_eq!(align_up(1, 4), Some(4));
    assert_eq!(align_up(9, 4), Some(12));
    assert_eq!(align_up(65, 64), Some(128));
}

#[test]
fn overflow_is_none() {
    assert_eq!(align_up(u32::MAX, 4), None);
    assert_eq!(align_up(u32::MAX - 2, 4), None);
}
