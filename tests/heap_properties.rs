use std::ptr::NonNull;

use fitheap::{AllocError, FreeError, HEADER_SIZE, Heap, HeapConfig, Status};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  Free(usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    3 => (1usize..600).prop_map(Op::Allocate),
    2 => any::<usize>().prop_map(Op::Free),
  ]
}

fn layout(heap: &Heap) -> Vec<(usize, Status, usize)> {
  heap
    .chunks()
    .map(|chunk| chunk.map(|chunk| (chunk.offset, chunk.status, chunk.size)))
    .collect::<Result<_, _>>()
    .unwrap()
}

/// Payload range `[start, end)` of a live allocation, as arena offsets.
fn payload_range(
  heap: &Heap,
  address: NonNull<u8>,
) -> (usize, usize) {
  let start = heap.offset_of(address.as_ptr()).unwrap();
  let chunk = heap
    .chunks()
    .map(Result::unwrap)
    .find(|chunk| chunk.offset + HEADER_SIZE == start)
    .unwrap();

  assert_eq!(chunk.status, Status::Allocated);
  (start, chunk.offset + chunk.size)
}

proptest! {
  #[test]
  fn invariants_hold_after_every_operation(
    size in 4096usize..16384,
    ops in prop::collection::vec(op(), 1..200),
  ) {
    let mut heap = Heap::new(size).unwrap();
    let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

    for op in ops {
      match op {
        Op::Allocate(size) => {
          if let Ok(address) = heap.allocate(size) {
            live.push((address, size));
          }
        }
        Op::Free(pick) if !live.is_empty() => {
          let (address, _) = live.swap_remove(pick % live.len());
          prop_assert_eq!(heap.deallocate(address.as_ptr()), Ok(()));
        }
        Op::Free(_) => {}
      }

      prop_assert_eq!(heap.check(), Ok(()));

      let tiled: usize = layout(&heap).iter().map(|&(_, _, size)| size).sum();
      prop_assert_eq!(tiled, heap.size());

      let free: Vec<usize> = layout(&heap)
        .into_iter()
        .filter(|&(_, status, _)| status == Status::Free)
        .map(|(offset, _, _)| offset)
        .collect();
      prop_assert_eq!(heap.free_chunks().collect::<Vec<_>>(), free);
    }

    let mut ranges: Vec<(usize, usize)> = live
      .iter()
      .map(|&(address, size)| {
        let range = payload_range(&heap, address);
        assert!(range.1 - range.0 >= size);
        range
      })
      .collect();
    ranges.sort();

    for pair in ranges.windows(2) {
      prop_assert!(pair[0].1 <= pair[1].0);
    }

    for (address, _) in live {
      prop_assert_eq!(heap.deallocate(address.as_ptr()), Ok(()));
    }

    prop_assert_eq!(layout(&heap), vec![(0, Status::Free, heap.size())]);
  }

  #[test]
  fn allocate_then_free_restores_the_heap(size in 1usize..4096 - HEADER_SIZE) {
    let mut heap = Heap::new(4096).unwrap();

    let address = heap.allocate(size).unwrap();
    heap.deallocate(address.as_ptr()).unwrap();

    prop_assert_eq!(layout(&heap), vec![(0, Status::Free, 4096)]);
    prop_assert_eq!(heap.free_chunks().collect::<Vec<_>>(), vec![0]);
  }

  #[test]
  fn allocations_are_word_aligned(sizes in prop::collection::vec(1usize..256, 1..20)) {
    let mut heap = Heap::new(8192).unwrap();

    for size in sizes {
      let address = heap.allocate(size).unwrap();
      let offset = heap.offset_of(address.as_ptr()).unwrap();

      prop_assert_eq!(offset % std::mem::size_of::<usize>(), 0);
    }
  }
}

#[test]
fn fresh_heap_is_one_free_chunk() {
  let heap = Heap::new(4096).unwrap();

  assert_eq!(layout(&heap), vec![(0, Status::Free, 4096)]);
}

#[test]
fn allocation_leaves_trailing_free_chunk() {
  let mut heap = Heap::new(4096).unwrap();

  heap.allocate(100).unwrap();

  let chunks = layout(&heap);
  assert_eq!(chunks.len(), 2);
  assert_eq!(chunks[0].1, Status::Allocated);
  assert!(chunks[0].2 >= 100 + HEADER_SIZE);
  assert_eq!(chunks[1], (chunks[0].2, Status::Free, 4096 - chunks[0].2));
}

#[test]
fn oversized_request_is_rejected() {
  let mut heap = Heap::new(4096).unwrap();

  assert!(matches!(heap.allocate(5000), Err(AllocError::TooLarge { .. })));
  assert_eq!(layout(&heap), vec![(0, Status::Free, 4096)]);
}

#[test]
fn adjacent_frees_merge_into_one_chunk() {
  let mut heap = Heap::new(4096).unwrap();

  let a = heap.allocate(100).unwrap();
  let b = heap.allocate(100).unwrap();

  heap.deallocate(a.as_ptr()).unwrap();
  heap.deallocate(b.as_ptr()).unwrap();

  assert_eq!(heap.free_chunks().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn separated_frees_stay_apart() {
  let mut heap = Heap::new(4096).unwrap();

  let a = heap.allocate(100).unwrap();
  let _wall = heap.allocate(100).unwrap();
  let b = heap.allocate(100).unwrap();
  let _tail = heap.allocate(100).unwrap();

  heap.deallocate(a.as_ptr()).unwrap();
  heap.deallocate(b.as_ptr()).unwrap();

  assert_eq!(heap.free_chunks().count(), 3);
  assert_eq!(heap.check(), Ok(()));
}

#[test]
fn null_and_double_free_are_reported() {
  let mut heap = Heap::new(4096).unwrap();
  let a = heap.allocate(100).unwrap();

  assert_eq!(heap.deallocate(std::ptr::null_mut()), Err(FreeError::Null));

  heap.deallocate(a.as_ptr()).unwrap();
  let before = layout(&heap);

  assert!(matches!(
    heap.deallocate(a.as_ptr()),
    Err(FreeError::NotAllocated { .. })
  ));
  assert_eq!(layout(&heap), before);
}

#[test]
fn larger_min_chunk_hands_out_whole_chunks() {
  let mut heap = Heap::with_config(HeapConfig::new(4096).min_chunk(4000)).unwrap();

  heap.allocate(100).unwrap();

  assert_eq!(layout(&heap), vec![(0, Status::Allocated, 4096)]);
}
