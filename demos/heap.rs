use std::ptr::NonNull;

use rheap::{Heap, print_heap};

const SOME_SIZE: u32 = 64;
const U64_SIZE: u32 = std::mem::size_of::<u64>() as u32;

/// Writes `0..count` into a `u64` array. Payloads are only word aligned.
unsafe fn fill_u64s(
  ptr: NonNull<u8>,
  count: u32,
) {
  let words = ptr.as_ptr().cast::<u64>();

  for i in 0..count as usize {
    unsafe { words.add(i).write_unaligned(i as u64) };
  }
}

fn main() {
  // Set RUST_LOG=trace to watch every split and merge.
  env_logger::init();

  let mut heap = Heap::new(80444, Some("My Heap Yay :3")).expect("failed to create heap");
  print_heap(Some(&heap), Some("INIT"));

  // --------------------------------------------------------------------
  // 1) Allocate a handful of arrays plus two tiny blocks.
  //    Odd sizes get rounded up to the 4 byte word.
  // --------------------------------------------------------------------
  let ull_array1 = heap.alloc(U64_SIZE * SOME_SIZE).expect("ull_array1");
  let ull_array2 = heap.alloc(U64_SIZE * SOME_SIZE + 8).expect("ull_array2");
  let ull_array3 = heap.alloc(U64_SIZE * SOME_SIZE + 10).expect("ull_array3");
  let ull_array4 = heap.alloc(U64_SIZE * SOME_SIZE + 101).expect("ull_array4");
  let byte_ptr = heap.alloc(1).expect("byte_ptr");
  let word_ptr = heap.alloc(4).expect("word_ptr");

  unsafe {
    fill_u64s(ull_array1, SOME_SIZE);
    fill_u64s(ull_array4, SOME_SIZE);
    byte_ptr.as_ptr().write(0xAB);
    word_ptr.as_ptr().cast::<u32>().write_unaligned(0xDEADBEEF);
  }

  println!("ull_array1 -> {:?}", ull_array1);
  println!("ull_array2 -> {:?}", ull_array2);
  println!("ull_array3 -> {:?}", ull_array3);
  println!("ull_array4 -> {:?}", ull_array4);
  println!("byte_ptr ---> {:?}", byte_ptr);
  println!("word_ptr ---> {:?}", word_ptr);
  println!();
  print_heap(Some(&heap), Some("ALLOCATED"));

  // --------------------------------------------------------------------
  // 2) Free two blocks from the middle. byte_ptr sits right behind
  //    ull_array4, so the second free merges both into one hole.
  // --------------------------------------------------------------------
  heap.dealloc(ull_array4).expect("dealloc ull_array4");
  print_heap(Some(&heap), Some("DEALLOC ull_array4"));

  heap.dealloc(byte_ptr).expect("dealloc byte_ptr");
  print_heap(Some(&heap), Some("DEALLOC byte_ptr"));

  // --------------------------------------------------------------------
  // 3) First fit: a 64 byte buffer lands in the hole left by ull_array4.
  // --------------------------------------------------------------------
  let string_buffer = heap.alloc(64).expect("string_buffer");
  println!(
    "string_buffer -> {:?} (reused ull_array4? {})\n",
    string_buffer,
    string_buffer == ull_array4
  );
  print_heap(Some(&heap), Some("ALLOCATE char[64] BUFFER"));

  // --------------------------------------------------------------------
  // 4) Free everything but the string buffer, then the buffer itself.
  //    The chain should collapse back to one free block.
  // --------------------------------------------------------------------
  for ptr in [ull_array1, ull_array2, ull_array3, word_ptr] {
    heap.dealloc(ptr).expect("dealloc");
  }
  print_heap(Some(&heap), Some("DEALLOC ALL BUT STRING BUFFER"));

  heap.dealloc(string_buffer).expect("dealloc string_buffer");
  print_heap(Some(&heap), Some("DEALLOC ALL"));

  // A second free of the same pointer is refused.
  if let Err(err) = heap.dealloc(string_buffer) {
    println!("double free rejected: {}", err);
  }

  println!("{:?}", heap.stats());

  heap.destroy();
}
