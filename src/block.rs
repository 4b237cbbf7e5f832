use std::{mem, ptr};

/// Allocation granularity. Every payload size and block boundary is a
/// multiple of this.
pub const WORD_SIZE: u32 = mem::size_of::<u32>() as u32;

/// Bytes taken by the inline header in front of every block.
pub const HEADER_SIZE: u32 = mem::size_of::<Header>() as u32;

/// Smallest block worth tracking: one header plus one word of payload.
pub const MIN_BLOCK_SIZE: u32 = HEADER_SIZE + WORD_SIZE;

/// Availability of a block, as stored in its header.
///
/// On disk the tag is one of two magic words rather than `0`/`1`, so a
/// header read from the wrong place (or stomped by a client) is very
/// unlikely to decode as either state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
  Free,
  Used,
}

impl Tag {
  pub const FREE_MAGIC: u32 = 0x3418_972F;
  pub const USED_MAGIC: u32 = 0x7A72_7D7B;

  /// Decodes a stored tag word. Anything but the two magic words is `None`.
  pub const fn from_raw(raw: u32) -> Option<Self> {
    match raw {
      Self::FREE_MAGIC => Some(Tag::Free),
      Self::USED_MAGIC => Some(Tag::Used),
      _ => None,
    }
  }

  pub const fn to_raw(self) -> u32 {
    match self {
      Tag::Free => Self::FREE_MAGIC,
      Tag::Used => Self::USED_MAGIC,
    }
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      Tag::Free => "FREE",
      Tag::Used => "USED",
    }
  }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
  pub tag: u32,
  pub size: u32,
}

impl Header {
  pub fn new(
    tag: Tag,
    size: u32,
  ) -> Self {
    Self { tag: tag.to_raw(), size }
  }

  pub fn tag(&self) -> Option<Tag> {
    Tag::from_raw(self.tag)
  }

  /// Reads the header stored at `base + offset`.
  ///
  /// # Safety
  ///
  /// `base + offset .. base + offset + HEADER_SIZE` must lie inside one
  /// live allocation.
  pub unsafe fn read(
    base: *const u8,
    offset: usize,
  ) -> Self {
    unsafe { ptr::read_unaligned(base.add(offset).cast::<Header>()) }
  }

  /// Writes this header at `base + offset`.
  ///
  /// # Safety
  ///
  /// Same bounds requirement as [`Header::read`], and `base` must be valid
  /// for writes.
  pub unsafe fn write(
    self,
    base: *mut u8,
    offset: usize,
  ) {
    unsafe { ptr::write_unaligned(base.add(offset).cast::<Header>(), self) }
  }
}
