use crate::error::InitError;

/// Offsets of every free chunk in the arena, kept in ascending address order.
///
/// ```text
///   Arena:      ┌────┬──────┬────┬────────┬────┬──────────┐
///               │ A  │  F   │ A  │   F    │ A  │    F     │
///               └────┴──────┴────┴────────┴────┴──────────┘
///                    ▲           ▲             ▲
///   Free list:     [ 0 ]       [ 1 ]         [ 2 ]
/// ```
///
/// Storage for `capacity` entries is reserved when the heap is created, so
/// the list does not reallocate during normal operation.
#[derive(Debug)]
pub struct FreeList {
  entries: Vec<usize>,
}

impl FreeList {
  pub fn with_capacity(capacity: usize) -> Result<Self, InitError> {
    let mut entries = Vec::new();

    entries
      .try_reserve_exact(capacity)
      .map_err(|_| InitError::FreeListUnavailable { entries: capacity })?;

    Ok(Self { entries })
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.entries.capacity()
  }

  pub fn get(
    &self,
    index: usize,
  ) -> Option<usize> {
    self.entries.get(index).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.entries.iter().copied()
  }

  /// Not used internally, for now we only need it for testing.
  #[cfg(test)]
  pub fn position(
    &self,
    offset: usize,
  ) -> Option<usize> {
    self.entries.iter().position(|&entry| entry == offset)
  }

  /// Inserts `offset` in address order and returns the index it landed at.
  pub fn insert(
    &mut self,
    offset: usize,
  ) -> usize {
    if self.entries.is_empty() {
      self.entries.push(offset);
      return 0;
    }

    let index = self
      .entries
      .iter()
      .position(|&entry| entry > offset)
      .unwrap_or(self.entries.len());

    debug_assert!(index == 0 || self.entries[index - 1] != offset);

    self.entries.insert(index, offset);
    index
  }

  pub fn remove(
    &mut self,
    index: usize,
  ) -> usize {
    self.entries.remove(index)
  }

  /// Swaps the entry at `index` for `offset` in place. The new offset must
  /// still sit between its neighbours.
  pub fn replace(
    &mut self,
    index: usize,
    offset: usize,
  ) {
    debug_assert!(index == 0 || self.entries[index - 1] < offset);
    debug_assert!(self.entries.get(index + 1).is_none_or(|&next| offset < next));

    self.entries[index] = offset;
  }
}
