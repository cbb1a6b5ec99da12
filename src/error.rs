//! Error types for heap initialization, allocation, deallocation and
//! diagnostics.

use std::io;

use thiserror::Error;

/// The heap could not be set up.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
  /// The arena buffer could not be obtained.
  #[error("cannot obtain a {size} byte arena")]
  ArenaUnavailable { size: usize },

  /// The free list storage could not be reserved.
  #[error("cannot reserve a free list of {entries} entries")]
  FreeListUnavailable { entries: usize },

  /// Chunk sizes are stored in 32 bits, so larger arenas are rejected.
  #[error("arena of {size} bytes exceeds the {max} byte limit")]
  ArenaTooLarge { size: usize, max: usize },

  /// The minimum chunk size must be non-zero.
  #[error("minimum chunk size must be at least one byte")]
  ZeroMinChunk,
}

/// An allocation request was rejected. The heap is left unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocError {
  #[error("invalid size: cannot allocate zero bytes")]
  ZeroSize,

  #[error("size too large: {requested} bytes do not fit in a {arena} byte arena")]
  TooLarge { requested: usize, arena: usize },

  #[error("insufficient memory: no free chunk holds {needed} bytes")]
  NoFit { needed: usize },
}

/// A deallocation request was rejected. These are programmer errors; the heap
/// is left unchanged and the caller decides whether to abort.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FreeError {
  #[error("attempt to free a null pointer")]
  Null,

  #[error("attempt to free {address:#x}, which does not belong to this heap")]
  OutOfRange { address: usize },

  #[error("attempt to free unallocated chunk at offset {offset}")]
  NotAllocated { offset: usize },
}

/// The arena or the free list no longer describe a consistent heap.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Corruption {
  #[error("corrupted heap: chunk status {tag:08x} at offset {offset}")]
  BadStatus { offset: usize, tag: u32 },

  #[error("corrupted heap: chunk at offset {offset} claims {size} bytes")]
  BadSize { offset: usize, size: usize },

  #[error("corrupted heap: free chunk at offset {offset} is missing from the free list")]
  Untracked { offset: usize },

  #[error("corrupted heap: free list entry {offset} is not a free chunk")]
  Stale { offset: usize },

  #[error("corrupted heap: free list is not sorted at entry {index}")]
  Unsorted { index: usize },

  #[error("corrupted heap: free chunks at offsets {left} and {right} were not merged")]
  Unmerged { left: usize, right: usize },
}

/// Writing a heap dump failed.
#[derive(Debug, Error)]
pub enum DumpError {
  #[error(transparent)]
  Corrupted(#[from] Corruption),

  #[error("failed to write heap dump: {0}")]
  Io(#[from] io::Error),
}
