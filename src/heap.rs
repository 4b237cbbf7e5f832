use std::ptr::{self, NonNull};

use libc::{c_void, free, malloc};
use log::{debug, trace, warn};

use crate::{
  align::align_up,
  block::{HEADER_SIZE, Header, MIN_BLOCK_SIZE, Tag, WORD_SIZE},
  config::HeapConfig,
  error::HeapError,
};

/// Longest label, in characters, a heap keeps for diagnostics.
pub const LABEL_MAX: usize = 32;

const HEADER: usize = HEADER_SIZE as usize;
const WORD: usize = WORD_SIZE as usize;
const MIN_BLOCK: usize = MIN_BLOCK_SIZE as usize;

/// A fixed-size arena managed as a chain of tagged blocks.
///
/// Every block is an 8-byte header followed by its payload. Headers carry no
/// `next` pointer: the next header always starts right after the current
/// payload, and the chain exactly covers `capacity` bytes.
///
/// The heap owns its buffer. Dropping it (or calling [`Heap::destroy`])
/// releases the buffer, after which every pointer handed out by
/// [`Heap::alloc`] dangles.
pub struct Heap {
  data: NonNull<u8>,
  capacity: u32,
  label: Option<String>,
}

// SAFETY: the buffer is exclusively owned by the heap and never shared with
// another heap. Moving the owner to another thread moves the buffer with it.
unsafe impl Send for Heap {}

impl Heap {
  /// Creates a heap of at least `capacity` bytes, wiped and holding a
  /// single free block.
  ///
  /// `capacity` is rounded up to the word size. `label` keeps at most
  /// [`LABEL_MAX`] characters and stops at the first NUL.
  ///
  /// ```
  /// use rheap::{Heap, HeapError};
  ///
  /// let heap = Heap::new(1021, Some("demo")).unwrap();
  /// assert_eq!(heap.capacity(), 1024);
  ///
  /// assert!(matches!(Heap::new(4, None), Err(HeapError::CapacityTooSmall { .. })));
  /// ```
  pub fn new(
    capacity: u32,
    label: Option<&str>,
  ) -> Result<Self, HeapError> {
    if capacity < MIN_BLOCK_SIZE {
      return Err(HeapError::CapacityTooSmall {
        requested: capacity,
        minimum: MIN_BLOCK_SIZE,
      });
    }

    let capacity = align_up(capacity).ok_or(HeapError::CapacityOverflow { requested: capacity })?;

    let raw = unsafe { malloc(capacity as usize) }.cast::<u8>();
    let data = NonNull::new(raw).ok_or(HeapError::OutOfMemory { bytes: capacity })?;

    let mut heap = Self {
      data,
      capacity,
      label: label.map(bounded_label),
    };
    heap.reset();

    debug!(
      "created heap {:?} at {:p}, {} bytes",
      heap.label, heap.data, heap.capacity
    );

    Ok(heap)
  }

  pub fn with_config(config: &HeapConfig) -> Result<Self, HeapError> {
    Self::new(config.capacity, config.label.as_deref())
  }

  /// Zeroes the whole buffer and starts over with one free block.
  ///
  /// Every pointer previously returned by [`Heap::alloc`] is invalidated.
  pub fn reset(&mut self) {
    unsafe {
      ptr::write_bytes(self.data.as_ptr(), 0, self.len());
      Header::new(Tag::Free, self.capacity - HEADER_SIZE).write(self.data.as_ptr(), 0);
    }

    trace!("reset heap at {:p}", self.data);
  }

  /// Releases the heap. Equivalent to dropping it.
  pub fn destroy(self) {}

  pub fn capacity(&self) -> u32 {
    self.capacity
  }

  pub fn label(&self) -> Option<&str> {
    self.label.as_deref()
  }

  /// Start of the arena buffer.
  pub fn as_ptr(&self) -> *const u8 {
    self.data.as_ptr()
  }

  /// Whether `ptr` points somewhere inside the arena buffer.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    let base = self.data.as_ptr().addr();
    (base..base + self.len()).contains(&ptr.addr())
  }

  /// Allocates `size` bytes, rounded up to the word size.
  ///
  /// Uses the first free block large enough. The block is split when the
  /// remainder can hold a header plus one word; otherwise the remainder
  /// stays with the allocation as padding.
  ///
  /// The returned pointer is word-aligned and valid for `size` bytes until
  /// it is passed to [`Heap::dealloc`], or the heap is reset or dropped.
  ///
  /// ```
  /// use rheap::Heap;
  ///
  /// let mut heap = Heap::new(1024, None).unwrap();
  ///
  /// let first = heap.alloc(100).unwrap();
  /// let second = heap.alloc(200).unwrap();
  /// assert!(second > first);
  ///
  /// assert!(heap.alloc(4096).is_err());
  /// ```
  pub fn alloc(
    &mut self,
    size: u32,
  ) -> Result<NonNull<u8>, HeapError> {
    let aligned = align_up(size).ok_or(HeapError::NoFit { requested: size })?;

    if aligned == 0 {
      return Err(HeapError::ZeroSize);
    }

    let offset = self
      .find_free(aligned)?
      .ok_or(HeapError::NoFit { requested: size })?;

    self.use_block(offset, aligned)?;

    let payload = unsafe { self.data.add(offset + HEADER) };

    trace!("alloc({}) -> {:p} (block at offset {})", size, payload, offset);

    Ok(payload)
  }

  /// Returns a block previously handed out by [`Heap::alloc`].
  ///
  /// The payload is zeroed and the block merged with any free neighbours.
  /// Pointers outside the arena, pointers that are not word-aligned and
  /// blocks that are already free are rejected without touching memory.
  ///
  /// A pointer into the middle of a live block, or a stale pointer whose
  /// block has since been handed out again, is not detected.
  pub fn dealloc(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<(), HeapError> {
    let offset = self.header_offset(ptr)?;
    let (tag, size) = self.read_header(offset)?;

    if tag != Tag::Used {
      warn!("dealloc({:p}): block at offset {} is already free", ptr, offset);
      return Err(HeapError::NotAllocated { offset });
    }

    unsafe {
      ptr::write_bytes(self.data.as_ptr().add(offset + HEADER), 0, size as usize);
      Header::new(Tag::Free, size).write(self.data.as_ptr(), offset);
    }

    trace!("dealloc({:p}) released {} bytes at offset {}", ptr, size, offset);

    self.coalesce();

    Ok(())
  }

  /// Usable size of the live block behind `ptr`.
  pub fn payload_size(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<u32, HeapError> {
    let offset = self.header_offset(ptr)?;

    match self.read_header(offset)? {
      (Tag::Used, size) => Ok(size),
      (Tag::Free, _) => Err(HeapError::NotAllocated { offset }),
    }
  }

  /// Merges every run of adjacent free blocks into one block.
  ///
  /// [`Heap::dealloc`] already runs this, so on a heap only touched through
  /// the public API it finds nothing to do. Returns the number of merges.
  pub fn coalesce(&mut self) -> usize {
    let mut merged = 0;
    let mut prev = 0;
    let mut cursor = self.next_header(prev);

    while let Some(curr) = cursor {
      let left = self.raw_header(prev);
      let right = self.raw_header(curr);

      if left.tag() == Some(Tag::Free) && right.tag() == Some(Tag::Free) && self.fits(curr, right.size) {
        let size = left.size + right.size + HEADER_SIZE;

        unsafe { Header::new(Tag::Free, size).write(self.data.as_ptr(), prev) };
        merged += 1;

        trace!("merged free block at offset {} into offset {} ({} bytes)", curr, prev, size);

        cursor = self.next_header(prev);
      } else {
        prev = curr;
        cursor = self.next_header(curr);
      }
    }

    merged
  }

  /// Walks the whole chain and checks that every header carries a known tag
  /// and that the blocks tile the arena with no gap and no overshoot.
  pub fn verify(&self) -> Result<(), HeapError> {
    let mut offset = 0;

    loop {
      let (_, size) = self.read_header(offset)?;
      let end = offset + HEADER + size as usize;

      if end == self.len() {
        return Ok(());
      }

      if end + MIN_BLOCK > self.len() {
        return Err(HeapError::BrokenChain { offset: end });
      }

      offset = end;
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.capacity as usize
  }

  /// Offset of the header following the one at `offset`, or `None` at the
  /// end of the chain.
  ///
  /// A candidate only counts if a minimal block fits between it and the end
  /// of the arena. Both coalescing and diagnostics step through here.
  pub(crate) fn next_header(
    &self,
    offset: usize,
  ) -> Option<usize> {
    let header = self.raw_header(offset);
    let candidate = offset.checked_add(HEADER + header.size as usize)?;

    (candidate + MIN_BLOCK <= self.len()).then_some(candidate)
  }

  /// Header at `offset`, undecoded. `offset + HEADER_SIZE` must not pass the
  /// end of the arena.
  pub(crate) fn raw_header(
    &self,
    offset: usize,
  ) -> Header {
    debug_assert!(offset + HEADER <= self.len());
    unsafe { Header::read(self.data.as_ptr(), offset) }
  }

  /// Decodes the header at `offset`, rejecting unknown tags and sizes that
  /// run past the arena.
  fn read_header(
    &self,
    offset: usize,
  ) -> Result<(Tag, u32), HeapError> {
    let header = self.raw_header(offset);

    let Some(tag) = header.tag() else {
      warn!("corrupt header at offset {}: tag {:#010x}", offset, header.tag);
      return Err(HeapError::CorruptHeader { offset, tag: header.tag });
    };

    if !self.fits(offset, header.size) {
      warn!("header at offset {} claims {} bytes past the arena", offset, header.size);
      return Err(HeapError::BrokenChain { offset });
    }

    Ok((tag, header.size))
  }

  fn fits(
    &self,
    offset: usize,
    size: u32,
  ) -> bool {
    offset + HEADER + size as usize <= self.len()
  }

  /// First-fit scan for a free block with at least `size` payload bytes.
  fn find_free(
    &self,
    size: u32,
  ) -> Result<Option<usize>, HeapError> {
    let mut offset = 0;

    while offset + HEADER <= self.len() {
      let (tag, payload) = self.read_header(offset)?;

      if tag == Tag::Free && payload >= size {
        return Ok(Some(offset));
      }

      offset += HEADER + payload as usize;
    }

    Ok(None)
  }

  /// Marks the free block at `offset` used for `size` bytes, splitting off
  /// the tail as a new free block when it can hold a minimal block.
  fn use_block(
    &mut self,
    offset: usize,
    size: u32,
  ) -> Result<(), HeapError> {
    let (tag, payload) = self.read_header(offset)?;

    if size == 0 {
      return Err(HeapError::ZeroSize);
    }

    if tag != Tag::Free || size > payload {
      return Err(HeapError::NoFit { requested: size });
    }

    let leftover = payload - size;

    let used = if leftover >= MIN_BLOCK_SIZE {
      let split = offset + HEADER + size as usize;
      unsafe { Header::new(Tag::Free, leftover - HEADER_SIZE).write(self.data.as_ptr(), split) };

      trace!("split block at offset {}: {} used, {} free at offset {}", offset, size, leftover - HEADER_SIZE, split);

      size
    } else {
      payload
    };

    unsafe { Header::new(Tag::Used, used).write(self.data.as_ptr(), offset) };

    Ok(())
  }

  /// Header offset for a payload pointer, if the pointer could be one.
  fn header_offset(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<usize, HeapError> {
    let addr = ptr.as_ptr().addr();
    let lo = self.data.as_ptr().addr() + HEADER;
    let hi = self.data.as_ptr().addr() + self.len() - WORD;

    if addr < lo || addr > hi {
      warn!("dealloc({:p}): outside heap at {:p}", ptr, self.data);
      return Err(HeapError::OutOfBounds { addr });
    }

    let offset = addr - lo;

    if offset % WORD != 0 {
      warn!("dealloc({:p}): not word aligned", ptr);
      return Err(HeapError::Misaligned { addr });
    }

    Ok(offset)
  }
}

impl Drop for Heap {
  fn drop(&mut self) {
    debug!("destroying heap {:?} at {:p}", self.label, self.data);

    unsafe { free(self.data.as_ptr().cast::<c_void>()) };
  }
}

fn bounded_label(label: &str) -> String {
  label.chars().take_while(|&c| c != '\0').take(LABEL_MAX).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chain(heap: &Heap) -> Vec<(usize, Tag, u32)> {
    heap
      .blocks()
      .map(|block| (block.offset, block.tag.unwrap(), block.size))
      .collect()
  }

  fn offset_of(
    heap: &Heap,
    ptr: NonNull<u8>,
  ) -> usize {
    ptr.as_ptr().addr() - heap.as_ptr().addr()
  }

  #[test]
  fn test_new_rejects_undersized() {
    for capacity in 0..MIN_BLOCK_SIZE {
      assert_eq!(
        Heap::new(capacity, None).err(),
        Some(HeapError::CapacityTooSmall { requested: capacity, minimum: 12 })
      );
    }

    let heap = Heap::new(MIN_BLOCK_SIZE, None).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 4)]);
  }

  #[test]
  fn test_new_rounds_capacity() {
    let heap = Heap::new(13, None).unwrap();
    assert_eq!(heap.capacity(), 16);
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 8)]);

    assert_eq!(
      Heap::new(u32::MAX, None).err(),
      Some(HeapError::CapacityOverflow { requested: u32::MAX })
    );
  }

  #[test]
  fn test_label_is_bounded() {
    let heap = Heap::new(64, Some("test")).unwrap();
    assert_eq!(heap.label(), Some("test"));

    let long = "a".repeat(40);
    let heap = Heap::new(64, Some(&long)).unwrap();
    assert_eq!(heap.label(), Some("a".repeat(32).as_str()));

    let heap = Heap::new(64, Some("abc\0def")).unwrap();
    assert_eq!(heap.label(), Some("abc"));

    let heap = Heap::new(64, None).unwrap();
    assert_eq!(heap.label(), None);
  }

  #[test]
  fn test_with_config() {
    let config = HeapConfig::builder().capacity(256).label("cfg").build();
    let heap = Heap::with_config(&config).unwrap();

    assert_eq!(heap.capacity(), 256);
    assert_eq!(heap.label(), Some("cfg"));
  }

  #[test]
  fn test_alloc_splits_first_fit() {
    let mut heap = Heap::new(1024, Some("test")).unwrap();

    let first = heap.alloc(100).unwrap();
    let second = heap.alloc(200).unwrap();

    assert!(second > first);
    assert_eq!(offset_of(&heap, first), 8);
    assert_eq!(offset_of(&heap, second), 116);
    assert_eq!(
      chain(&heap),
      vec![(0, Tag::Used, 100), (108, Tag::Used, 200), (316, Tag::Free, 700)]
    );
  }

  #[test]
  fn test_alloc_rounds_to_word() {
    let mut heap = Heap::new(256, None).unwrap();

    let ptr = heap.alloc(1).unwrap();
    assert_eq!(heap.payload_size(ptr), Ok(4));
    assert_eq!(ptr.as_ptr().addr() % WORD, heap.as_ptr().addr() % WORD);

    let ptr = heap.alloc(10).unwrap();
    assert_eq!(heap.payload_size(ptr), Ok(12));
  }

  #[test]
  fn test_alloc_zero_fails() {
    let mut heap = Heap::new(256, None).unwrap();

    assert_eq!(heap.alloc(0), Err(HeapError::ZeroSize));
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 248)]);
  }

  #[test]
  fn test_alloc_too_large_fails() {
    let mut heap = Heap::new(64, None).unwrap();

    assert_eq!(heap.alloc(1000), Err(HeapError::NoFit { requested: 1000 }));
    assert_eq!(heap.alloc(u32::MAX), Err(HeapError::NoFit { requested: u32::MAX }));
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 56)]);
  }

  #[test]
  fn test_alloc_whole_heap() {
    let mut heap = Heap::new(64, None).unwrap();

    let ptr = heap.alloc(56).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Used, 56)]);
    assert_eq!(heap.alloc(4), Err(HeapError::NoFit { requested: 4 }));

    heap.dealloc(ptr).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 56)]);
  }

  #[test]
  fn test_small_leftover_is_absorbed() {
    let mut heap = Heap::new(64, None).unwrap();

    // 56 - 48 = 8 bytes left, not enough for a header plus a word.
    let ptr = heap.alloc(48).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Used, 56)]);
    assert_eq!(heap.payload_size(ptr), Ok(56));
    assert_eq!(heap.verify(), Ok(()));

    // 56 - 44 = 12 bytes left, exactly one minimal block.
    heap.reset();
    heap.alloc(44).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Used, 44), (52, Tag::Free, 4)]);
    assert_eq!(heap.verify(), Ok(()));
  }

  #[test]
  fn test_minimal_tail_block_is_reachable() {
    let mut heap = Heap::new(64, None).unwrap();

    heap.alloc(44).unwrap();
    let tail = heap.alloc(4).unwrap();

    assert_eq!(offset_of(&heap, tail), 60);
    assert_eq!(chain(&heap), vec![(0, Tag::Used, 44), (52, Tag::Used, 4)]);
  }

  #[test]
  fn test_reuse_after_dealloc() {
    let mut heap = Heap::new(1024, Some("test")).unwrap();

    let first = heap.alloc(100).unwrap();
    let second = heap.alloc(200).unwrap();

    heap.dealloc(first).unwrap();
    assert_eq!(
      chain(&heap),
      vec![(0, Tag::Free, 100), (108, Tag::Used, 200), (316, Tag::Free, 700)]
    );

    let third = heap.alloc(50).unwrap();
    assert_eq!(third, first);
    assert_eq!(
      chain(&heap),
      vec![(0, Tag::Used, 52), (60, Tag::Free, 40), (108, Tag::Used, 200), (316, Tag::Free, 700)]
    );

    heap.dealloc(second).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Used, 52), (60, Tag::Free, 956)]);
    assert_eq!(heap.coalesce(), 0);
    assert_eq!(heap.verify(), Ok(()));
  }

  #[test]
  fn test_dealloc_zeroes_payload() {
    let mut heap = Heap::new(256, None).unwrap();

    let ptr = heap.alloc(32).unwrap();
    let guard = heap.alloc(8).unwrap();

    unsafe { ptr::write_bytes(ptr.as_ptr(), 0xAB, 32) };
    heap.dealloc(ptr).unwrap();

    let payload = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 32) };
    assert!(payload.iter().all(|&byte| byte == 0));

    heap.dealloc(guard).unwrap();
  }

  #[test]
  fn test_double_free_fails() {
    let mut heap = Heap::new(256, None).unwrap();

    let first = heap.alloc(16).unwrap();
    let second = heap.alloc(16).unwrap();

    assert_eq!(heap.dealloc(first), Ok(()));
    assert_eq!(heap.dealloc(first), Err(HeapError::NotAllocated { offset: 0 }));

    // Merged into its free neighbour, the stale header still reads FREE.
    assert_eq!(heap.dealloc(second), Ok(()));
    assert_eq!(heap.dealloc(second), Err(HeapError::NotAllocated { offset: 24 }));
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 248)]);
  }

  #[test]
  fn test_dealloc_out_of_bounds() {
    let mut heap = Heap::new(256, None).unwrap();
    let mut other = Heap::new(256, None).unwrap();

    let foreign = other.alloc(16).unwrap();
    assert!(matches!(heap.dealloc(foreign), Err(HeapError::OutOfBounds { .. })));

    let base = NonNull::new(heap.as_ptr() as *mut u8).unwrap();
    assert!(matches!(heap.dealloc(base), Err(HeapError::OutOfBounds { .. })));

    let last = unsafe { base.add(256 - 4) };
    // In range, but the "header" in front of it is zeroed payload.
    assert_eq!(heap.dealloc(last), Err(HeapError::CorruptHeader { offset: 244, tag: 0 }));

    let past = unsafe { base.add(256 - 3) };
    assert!(matches!(heap.dealloc(past), Err(HeapError::OutOfBounds { .. })));

    assert!(matches!(heap.dealloc(NonNull::dangling()), Err(HeapError::OutOfBounds { .. })));
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 248)]);
  }

  #[test]
  fn test_dealloc_misaligned() {
    let mut heap = Heap::new(256, None).unwrap();

    let ptr = heap.alloc(16).unwrap();
    let inner = unsafe { ptr.add(1) };

    assert!(matches!(heap.dealloc(inner), Err(HeapError::Misaligned { .. })));
    assert_eq!(heap.payload_size(ptr), Ok(16));
  }

  #[test]
  fn test_dealloc_corrupt_header() {
    let mut heap = Heap::new(256, None).unwrap();

    let ptr = heap.alloc(16).unwrap();
    unsafe { ptr.as_ptr().sub(HEADER).cast::<u32>().write_unaligned(0xDEAD) };

    assert_eq!(heap.dealloc(ptr), Err(HeapError::CorruptHeader { offset: 0, tag: 0xDEAD }));
    assert_eq!(heap.alloc(8), Err(HeapError::CorruptHeader { offset: 0, tag: 0xDEAD }));
    assert_eq!(heap.verify(), Err(HeapError::CorruptHeader { offset: 0, tag: 0xDEAD }));

    heap.reset();
    assert_eq!(heap.verify(), Ok(()));
  }

  #[test]
  fn test_oversized_header_is_broken_chain() {
    let mut heap = Heap::new(256, None).unwrap();

    let ptr = heap.alloc(16).unwrap();
    unsafe { ptr.as_ptr().sub(WORD).cast::<u32>().write_unaligned(4096) };

    assert_eq!(heap.dealloc(ptr), Err(HeapError::BrokenChain { offset: 0 }));
    assert_eq!(heap.verify(), Err(HeapError::BrokenChain { offset: 0 }));
  }

  #[test]
  fn test_coalesce_merges_runs() {
    let mut heap = Heap::new(256, None).unwrap();

    let ptrs: Vec<_> = (0..4).map(|_| heap.alloc(16).unwrap()).collect();

    heap.dealloc(ptrs[1]).unwrap();
    heap.dealloc(ptrs[3]).unwrap();
    assert_eq!(
      chain(&heap),
      vec![(0, Tag::Used, 16), (24, Tag::Free, 16), (48, Tag::Used, 16), (72, Tag::Free, 176)]
    );

    heap.dealloc(ptrs[2]).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Used, 16), (24, Tag::Free, 224)]);

    heap.dealloc(ptrs[0]).unwrap();
    assert_eq!(chain(&heap), vec![(0, Tag::Free, 248)]);
  }

  #[test]
  fn test_coalesce_three_way_in_one_pass() {
    let mut heap = Heap::new(256, None).unwrap();

    let ptrs: Vec<_> = (0..3).map(|_| heap.alloc(16).unwrap()).collect();
    heap.alloc(16).unwrap();

    // Flip tags by hand so that three free neighbours exist at once.
    for ptr in &ptrs {
      let offset = offset_of(&heap, *ptr) - HEADER;
      unsafe { Header::new(Tag::Free, 16).write(heap.data.as_ptr(), offset) };
    }

    assert_eq!(heap.coalesce(), 2);
    assert_eq!(heap.coalesce(), 0);
    assert_eq!(
      chain(&heap),
      vec![(0, Tag::Free, 64), (72, Tag::Used, 16), (96, Tag::Free, 152)]
    );
  }

  #[test]
  fn test_reset_wipes_everything() {
    let mut heap = Heap::new(128, None).unwrap();

    let ptr = heap.alloc(16).unwrap();
    unsafe { ptr::write_bytes(ptr.as_ptr(), 0xFF, 16) };
    heap.alloc(32).unwrap();

    heap.reset();

    assert_eq!(chain(&heap), vec![(0, Tag::Free, 120)]);
    let bytes = unsafe { std::slice::from_raw_parts(heap.as_ptr().add(HEADER), 120) };
    assert!(bytes.iter().all(|&byte| byte == 0));
  }

  #[test]
  fn test_contains() {
    let mut heap = Heap::new(64, None).unwrap();
    let ptr = heap.alloc(8).unwrap();

    assert!(heap.contains(ptr.as_ptr()));
    assert!(heap.contains(heap.as_ptr()));
    assert!(!heap.contains(heap.as_ptr().wrapping_add(64)));
  }

  #[test]
  fn test_heap_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Heap>();

    let heap = std::sync::Mutex::new(Heap::new(128, None).unwrap());

    std::thread::scope(|scope| {
      scope.spawn(|| {
        let mut heap = heap.lock().unwrap();
        let ptr = heap.alloc(8).unwrap();
        heap.dealloc(ptr).unwrap();
      });
    });

    heap.into_inner().unwrap().destroy();
  }

  mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
      Alloc(u32),
      Dealloc(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
      prop_oneof![
        (1_u32..300).prop_map(Op::Alloc),
        any::<usize>().prop_map(Op::Dealloc),
      ]
    }

    fn run(
      heap: &mut Heap,
      ops: &[Op],
      mut after_each: impl FnMut(&Heap),
    ) {
      let mut live: Vec<NonNull<u8>> = Vec::new();

      for op in ops {
        match op {
          Op::Alloc(size) => {
            if let Ok(ptr) = heap.alloc(*size) {
              live.push(ptr);
            }
          }
          Op::Dealloc(index) => {
            if !live.is_empty() {
              let ptr = live.swap_remove(index % live.len());
              heap.dealloc(ptr).unwrap();
            }
          }
        }

        after_each(heap);
      }
    }

    proptest! {
      #[test]
      fn chain_tiles_arena(capacity in 12_u32..4096, ops in proptest::collection::vec(op(), 1..64)) {
        let mut heap = Heap::new(capacity, None).unwrap();

        run(&mut heap, &ops, |heap| {
          assert_eq!(heap.verify(), Ok(()));

          let covered: usize = heap.blocks().map(|block| HEADER + block.size as usize).sum();
          assert_eq!(covered, heap.len());
        });
      }

      #[test]
      fn chain_is_coalesced_at_rest(ops in proptest::collection::vec(op(), 1..64)) {
        let mut heap = Heap::new(2048, None).unwrap();

        run(&mut heap, &ops, |heap| {
          let tags: Vec<_> = heap.blocks().map(|block| block.tag).collect();
          assert!(tags.windows(2).all(|pair| !(pair[0] == Some(Tag::Free) && pair[1] == Some(Tag::Free))));
        });

        let before = chain(&heap);
        prop_assert_eq!(heap.coalesce(), 0);
        prop_assert_eq!(heap.coalesce(), 0);
        prop_assert_eq!(chain(&heap), before);
      }

      #[test]
      fn alloc_dealloc_round_trip(capacity in 12_u32..4096, size in 1_u32..4096) {
        let mut heap = Heap::new(capacity, None).unwrap();
        let before = chain(&heap);

        if let Ok(ptr) = heap.alloc(size) {
          heap.dealloc(ptr).unwrap();
        }

        prop_assert_eq!(chain(&heap), before);
      }
    }
  }
}
