use std::mem;

use crate::{align, error::InitError, header::HEADER_SIZE};

/// Minimum total space for a heap.
pub const MIN_HEAP: usize = 4096;

/// Minimum payload space a free chunk may be left with after a split.
pub const MIN_CHUNK: usize = 32;

/// Largest arena whose chunk sizes still fit the 32-bit header field.
pub const MAX_HEAP: usize = (u32::MAX as usize) & !(mem::size_of::<usize>() - 1);

/// Size settings for a [`crate::Heap`].
///
/// ```rust
/// use fitheap::HeapConfig;
///
/// let config = HeapConfig::new(100).min_heap(256);
/// assert_eq!(config.arena_size(), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  size: usize,
  min_heap: usize,
  min_chunk: usize,
}

impl HeapConfig {
  pub fn new(size: usize) -> Self {
    Self {
      size,
      min_heap: MIN_HEAP,
      min_chunk: MIN_CHUNK,
    }
  }

  /// Floor applied to the requested size.
  pub fn min_heap(
    mut self,
    min_heap: usize,
  ) -> Self {
    self.min_heap = min_heap;
    self
  }

  /// Smallest free remainder worth splitting off, header excluded.
  pub fn min_chunk(
    mut self,
    min_chunk: usize,
  ) -> Self {
    self.min_chunk = min_chunk;
    self
  }

  pub fn requested_size(&self) -> usize {
    self.size
  }

  pub fn min_chunk_size(&self) -> usize {
    self.min_chunk
  }

  /// Effective arena size: the request clamped up to the minimum heap size
  /// (never below one header) and rounded up to a word multiple.
  pub fn arena_size(&self) -> usize {
    let size = self.size.max(self.min_heap).max(HEADER_SIZE);
    align!(size.min(MAX_HEAP))
  }

  /// Number of free list entries reserved up front.
  pub fn free_list_capacity(&self) -> usize {
    (self.arena_size() / self.min_chunk.max(1)).max(1)
  }

  pub(crate) fn validate(&self) -> Result<(), InitError> {
    if self.min_chunk == 0 {
      return Err(InitError::ZeroMinChunk);
    }

    let size = self.size.max(self.min_heap);
    if size > MAX_HEAP {
      return Err(InitError::ArenaTooLarge { size, max: MAX_HEAP });
    }

    Ok(())
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new(MIN_HEAP)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_small_requests_are_clamped() {
    assert_eq!(HeapConfig::new(0).arena_size(), MIN_HEAP);
    assert_eq!(HeapConfig::new(100).arena_size(), MIN_HEAP);
    assert_eq!(HeapConfig::default().arena_size(), MIN_HEAP);
  }

  #[test]
  fn test_sizes_round_to_word() {
    let word = mem::size_of::<usize>();

    assert_eq!(HeapConfig::new(MIN_HEAP + 1).arena_size(), MIN_HEAP + word);
    assert_eq!(HeapConfig::new(8192).arena_size(), 8192);
  }

  #[test]
  fn test_free_list_capacity() {
    assert_eq!(HeapConfig::new(4096).free_list_capacity(), 4096 / MIN_CHUNK);
    assert_eq!(HeapConfig::new(4096).min_chunk(64).free_list_capacity(), 64);
  }

  #[test]
  fn test_validate() {
    assert_eq!(HeapConfig::new(4096).validate(), Ok(()));
    assert_eq!(HeapConfig::new(4096).min_chunk(0).validate(), Err(InitError::ZeroMinChunk));
    assert!(matches!(
      HeapConfig::new(u32::MAX as usize).validate(),
      Err(InitError::ArenaTooLarge { .. })
    ));
    assert!(matches!(
      HeapConfig::new(1).min_heap(usize::MAX).validate(),
      Err(InitError::ArenaTooLarge { .. })
    ));
  }
}
