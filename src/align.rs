/// Rounds a `u32` size up to the heap's word size.
///
/// Overflows like plain `u32` addition; use [`align_up`] when the input is
/// caller supplied.
///
/// # Examples
///
/// ```rust
/// use rheap::align;
///
/// assert_eq!(align!(0u32), 0);
/// assert_eq!(align!(13u32), 16);
/// assert_eq!(align!(100u32), 100);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::WORD_SIZE - 1) & !($crate::WORD_SIZE - 1)
  };
}

/// Checked form of [`align!`]. Returns `None` if rounding would overflow.
pub const fn align_up(value: u32) -> Option<u32> {
  match value.checked_add(crate::WORD_SIZE - 1) {
    Some(padded) => Some(padded & !(crate::WORD_SIZE - 1)),
    None => None,
  }
}
