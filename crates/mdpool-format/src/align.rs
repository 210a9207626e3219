//! Alignment arithmetic.

/// Round `value` up to the next multiple of `align`.
///
/// `align` must be a power of two. Returns `None` when the rounded value
/// does not fit in `u32`.
#[inline]
pub fn align_up(value: u32, align: u32) -> Option<u32> {
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    let mask = align - 1;
    value.checked_add(mask).map(|v| v & !mask)
}
