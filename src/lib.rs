//! # rheap - A Fixed-Arena Free-List Allocator
//!
//! This crate provides a single-arena **free-list allocator**: one buffer is
//! taken from the platform up front, and every allocation after that is
//! carved out of it without going back to the system allocator.
//!
//! ## Overview
//!
//! The arena is always covered, end to end, by a chain of blocks. Each block
//! is a small header followed by its payload:
//!
//! ```text
//!   Arena Layout:
//!
//!   offset 0                                                     capacity
//!   ┌────────┬──────────────┬────────┬──────┬────────┬───────────────────┐
//!   │ header │   payload    │ header │ pay- │ header │     payload       │
//!   │  USED  │   N bytes    │  FREE  │ load │  USED  │                   │
//!   └────────┴──────────────┴────────┴──────┴────────┴───────────────────┘
//!            ▲
//!            └── Pointer returned to user
//!
//!   next header = this header + HEADER_SIZE + payload size
//! ```
//!
//! There are no `next` pointers. The position of the next header is
//! computed from the size of the current one, and the last block ends
//! exactly at `capacity`.
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── align      - Word rounding (align!, align_up)
//!   ├── block      - Header layout and FREE/USED tags (internal)
//!   ├── config     - HeapConfig and its builder
//!   ├── error      - HeapError
//!   ├── heap       - Heap: create, alloc, dealloc, coalesce, verify
//!   └── report     - Block iteration, stats, printable reports
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::Heap;
//!
//! let mut heap = Heap::new(1024, Some("scratch")).unwrap();
//!
//! let ptr = heap.alloc(8).unwrap();
//!
//! unsafe {
//!     // Payloads are word (4 byte) aligned.
//!     ptr.as_ptr().cast::<u64>().write_unaligned(42);
//!     assert_eq!(ptr.as_ptr().cast::<u64>().read_unaligned(), 42);
//! }
//!
//! heap.dealloc(ptr).unwrap();
//! assert!(heap.dealloc(ptr).is_err()); // double free is caught
//!
//! heap.destroy();
//! ```
//!
//! ## How It Works
//!
//! Allocation is first fit. The found block is split when the remainder can
//! still hold a header and one word; otherwise the remainder is kept as
//! padding of the allocation:
//!
//! ```text
//!   alloc(24) on a 96 byte free block:
//!
//!   before  ┌────────┬───────────────────────────────────────────────┐
//!           │ FREE 96│                                               │
//!           └────────┴───────────────────────────────────────────────┘
//!   after   ┌────────┬────────────┬────────┬─────────────────────────┐
//!           │ USED 24│            │ FREE 64│                         │
//!           └────────┴────────────┴────────┴─────────────────────────┘
//! ```
//!
//! Freeing zeroes the payload, flips the tag, and merges every run of
//! neighbouring free blocks, so two free blocks are never adjacent once a
//! call returns:
//!
//! ```text
//!   ┌──────┬──────┬──────┐  dealloc(B)   ┌──────┬──────────────────┐
//!   │ A    │ B    │ C    │  ──────────►  │ A    │ B + C            │
//!   │ USED │ USED │ FREE │               │ USED │ FREE             │
//!   └──────┴──────┴──────┘               └──────┴──────────────────┘
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Heap` is `Send` but not `Sync`; wrap it in a
//!   mutex to share it
//! - **Fixed size**: the arena never grows
//! - **No realloc**
//! - **Best-effort pointer checks**: out-of-range, misaligned and already
//!   freed pointers are rejected, but a stale pointer into a block that was
//!   handed out again is not
//!
//! ## Safety
//!
//! The heap API itself is safe to call. Reading or writing through a
//! returned pointer is `unsafe` as usual, and is only sound while the block
//! is live and the heap has not been reset or dropped.

pub mod align;
mod block;
mod config;
mod error;
mod heap;
mod report;

pub use align::align_up;
pub use block::{HEADER_SIZE, MIN_BLOCK_SIZE, Tag, WORD_SIZE};
pub use config::{HeapConfig, HeapConfigBuilder};
pub use error::HeapError;
pub use heap::{Heap, LABEL_MAX};
pub use report::{Block, Blocks, HeapStats, print_heap};
