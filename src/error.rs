use thiserror::Error;

/// Everything a heap operation can refuse to do.
///
/// A failed operation leaves the heap exactly as it found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
  #[error("capacity {requested} is below the minimum of {minimum} bytes")]
  CapacityTooSmall { requested: u32, minimum: u32 },
  #[error("capacity {requested} cannot be rounded up to a word boundary")]
  CapacityOverflow { requested: u32 },
  #[error("could not obtain {bytes} bytes for the heap buffer")]
  OutOfMemory { bytes: u32 },
  #[error("zero-sized allocation")]
  ZeroSize,
  #[error("no free block can hold {requested} bytes")]
  NoFit { requested: u32 },
  #[error("pointer {addr:#x} is outside the heap")]
  OutOfBounds { addr: usize },
  #[error("pointer {addr:#x} is not on a word boundary")]
  Misaligned { addr: usize },
  #[error("block at offset {offset} is not allocated")]
  NotAllocated { offset: usize },
  #[error("header at offset {offset} holds unknown tag {tag:#010x}")]
  CorruptHeader { offset: usize, tag: u32 },
  #[error("block chain breaks at offset {offset}")]
  BrokenChain { offset: usize },
}
