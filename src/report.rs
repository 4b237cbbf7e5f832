use std::fmt;

use crate::{block::Tag, heap::Heap};

/// One block of the chain as seen by [`Heap::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  /// Offset of the header from the start of the arena.
  pub offset: usize,
  /// Decoded tag, `None` if the header holds neither magic word.
  pub tag: Option<Tag>,
  /// Payload bytes following the header.
  pub size: u32,
}

/// Iterator over the block chain, front to back.
///
/// Stops after the first block with an unknown tag.
pub struct Blocks<'a> {
  heap: &'a Heap,
  next: Option<usize>,
}

impl Iterator for Blocks<'_> {
  type Item = Block;

  fn next(&mut self) -> Option<Block> {
    let offset = self.next?;
    let header = self.heap.raw_header(offset);
    let tag = header.tag();

    self.next = match tag {
      Some(_) => self.heap.next_header(offset),
      None => None,
    };

    Some(Block { offset, tag, size: header.size })
  }
}

/// Occupancy summary computed from one walk of the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub free_blocks: usize,
  pub used_blocks: usize,
  /// Payload bytes in free blocks.
  pub free_bytes: usize,
  /// Payload bytes in used blocks, padding included.
  pub used_bytes: usize,
  /// Largest single allocation that would currently succeed.
  pub largest_free: u32,
}

impl Heap {
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks { heap: self, next: Some(0) }
  }

  pub fn stats(&self) -> HeapStats {
    self.blocks().fold(HeapStats::default(), |mut stats, block| {
      match block.tag {
        Some(Tag::Free) => {
          stats.free_blocks += 1;
          stats.free_bytes += block.size as usize;
          stats.largest_free = stats.largest_free.max(block.size);
        }
        Some(Tag::Used) => {
          stats.used_blocks += 1;
          stats.used_bytes += block.size as usize;
        }
        None => {}
      }
      stats
    })
  }
}

impl fmt::Display for Heap {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Heap: {:p}", self)?;

    match self.label() {
      Some(label) => writeln!(f, "  Label: \"{}\"", label)?,
      None => writeln!(f, "  Label: none")?,
    }

    writeln!(f, "  Size: {} bytes", self.capacity())?;
    writeln!(f, "  Data: {:p}", self.as_ptr())?;

    for block in self.blocks() {
      let addr = self.as_ptr().wrapping_add(block.offset);

      match block.tag {
        Some(tag) => writeln!(f, "    Block: {:p} -> [{}] {} bytes", addr, tag.as_str(), block.size)?,
        None => writeln!(f, "    Block: {:p} -> INVALID", addr)?,
      }
    }

    Ok(())
  }
}

impl fmt::Debug for Heap {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Heap")
      .field("data", &self.as_ptr())
      .field("capacity", &self.capacity())
      .field("label", &self.label())
      .finish()
  }
}

/// Prints a titled report of `heap` to stdout. `None` prints a stub report.
pub fn print_heap(
  heap: Option<&Heap>,
  title: Option<&str>,
) {
  match title {
    Some(title) => println!(" :: {}", title),
    None => println!(),
  }
  println!(" ############################");
  println!(" ########### HEAP ###########");
  println!(" ############################");
  println!();

  match heap {
    Some(heap) => println!("{}", heap),
    None => println!("Heap: null\n"),
  }
}
