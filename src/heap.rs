use std::{
  io::{self, Write},
  ptr::NonNull,
};

use tracing::{debug, error, warn};

use crate::{
  align,
  arena::Arena,
  config::HeapConfig,
  error::{AllocError, Corruption, DumpError, FreeError, InitError},
  free_list::FreeList,
  header::{HEADER_SIZE, Header, Status},
};

/// Number of chunks printed on each line of a heap dump.
const DUMP_COLUMNS: usize = 5;

/// A best-fit allocator over one fixed-size arena.
///
/// ```text
///   ┌─────────────┬───────────────────┬─────────┬──────────────────────┐
///   │ A (112)     │ F (256)           │ A (48)  │ F (3680)             │
///   └─────────────┴───────────────────┴─────────┴──────────────────────┘
///                 ▲                             ▲
///   free list:  [112,                          416]
/// ```
///
/// Chunks tile the arena from its first byte to its last. Free chunks are
/// listed by address in the free list and no two of them are ever physically
/// adjacent.
pub struct Heap {
  arena: Arena,
  free_list: FreeList,
  min_chunk: usize,
}

/// One chunk found while walking the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
  pub offset: usize,
  pub status: Status,
  pub size: usize,
}

/// Summary of the heap's free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
  pub arena_size: usize,
  pub free_chunks: usize,
  pub free_bytes: usize,
  pub largest_free_chunk: usize,
  pub free_list_capacity: usize,
}

impl Heap {
  /// Creates a heap of at least `size` bytes with default settings.
  pub fn new(size: usize) -> Result<Self, InitError> {
    Self::with_config(HeapConfig::new(size))
  }

  /// Creates a heap holding one free chunk that spans the whole arena.
  pub fn with_config(config: HeapConfig) -> Result<Self, InitError> {
    config.validate()?;

    let size = config.arena_size();
    let mut arena = Arena::zeroed(size)?;
    let mut free_list = FreeList::with_capacity(config.free_list_capacity())?;

    arena.write_header(0, Header::new(Status::Free, size));
    free_list.insert(0);

    debug!(
      size,
      requested = config.requested_size(),
      free_list_capacity = free_list.capacity(),
      "heap initialized"
    );

    Ok(Self {
      arena,
      free_list,
      min_chunk: config.min_chunk_size(),
    })
  }

  /// Releases the arena and the free list.
  pub fn teardown(self) {
    debug!(size = self.arena.len(), "heap released");
  }

  /// Total arena size in bytes.
  pub fn size(&self) -> usize {
    self.arena.len()
  }

  /// Offsets of all free chunks, lowest address first.
  pub fn free_chunks(&self) -> impl Iterator<Item = usize> + '_ {
    self.free_list.iter()
  }

  /// Allocates a chunk with room for at least `size` bytes and returns a
  /// pointer to its payload.
  ///
  /// The smallest free chunk that fits is chosen. If what would be left of
  /// it is too small to become a chunk of its own, the whole chunk is handed
  /// out; otherwise it is split and the remainder stays free.
  ///
  /// ```text
  ///   before:  ┌───────────────────────────────────────────┐
  ///            │ F (size)                                  │
  ///            └───────────────────────────────────────────┘
  ///   after:   ┌───────────────┬───────────────────────────┐
  ///            │ A (total)     │ F (size - total)          │
  ///            └───────────────┴───────────────────────────┘
  ///              ▲              ▲
  ///              └── returned   └── takes the old free list slot
  /// ```
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size < 1 {
      warn!("rejected allocation of zero bytes");
      return Err(AllocError::ZeroSize);
    }

    let arena = self.arena.len();

    if size > arena || align!(size) + HEADER_SIZE > arena {
      warn!(size, arena, "rejected allocation larger than the arena");
      return Err(AllocError::TooLarge { requested: size, arena });
    }

    let total = align!(size) + HEADER_SIZE;

    let Some((index, offset, chunk_size)) = self.best_fit(total) else {
      warn!(size, needed = total, free_chunks = self.free_list.len(), "no free chunk fits");
      return Err(AllocError::NoFit { needed: total });
    };

    let remainder = chunk_size - total;

    if remainder < self.min_chunk + HEADER_SIZE {
      self.arena.write_header(offset, Header::new(Status::Allocated, chunk_size));
      self.free_list.remove(index);

      debug!(size, offset, chunk_size, "allocated whole chunk");
    } else {
      self.arena.write_header(offset, Header::new(Status::Allocated, total));
      self.arena.write_header(offset + total, Header::new(Status::Free, remainder));
      self.free_list.replace(index, offset + total);

      debug!(size, offset, chunk_size = total, remainder, "allocated split chunk");
    }

    Ok(self.arena.pointer(offset + HEADER_SIZE))
  }

  /// Smallest free chunk of at least `total` bytes as
  /// `(free list index, offset, size)`. Ties go to the lowest address.
  fn best_fit(
    &self,
    total: usize,
  ) -> Option<(usize, usize, usize)> {
    self
      .free_list
      .iter()
      .enumerate()
      .map(|(index, offset)| (index, offset, self.arena.header(offset).size()))
      .filter(|&(_, _, size)| size >= total)
      .min_by_key(|&(_, _, size)| size)
  }

  /// Returns the chunk owning `address` to the free list and merges it with
  /// any free chunk directly before or after it.
  ///
  /// Null pointers, pointers that were not returned by [`Heap::allocate`]
  /// and double frees are rejected without touching the heap.
  pub fn deallocate(
    &mut self,
    address: *mut u8,
  ) -> Result<(), FreeError> {
    if address.is_null() {
      error!("attempt to free a null pointer");
      return Err(FreeError::Null);
    }

    let Some(offset) = self.chunk_of(address) else {
      error!(address = address as usize, "attempt to free a pointer outside the heap");
      return Err(FreeError::OutOfRange { address: address as usize });
    };

    let header = self.arena.header(offset);

    if !header.is_allocated() || !self.spans_arena(offset, header.size()) {
      error!(offset, tag = header.tag(), "attempt to free unallocated chunk");
      return Err(FreeError::NotAllocated { offset });
    }

    self.arena.write_header(offset, Header::new(Status::Free, header.size()));

    let index = self.free_list.insert(offset);
    self.coalesce(index);

    debug!(offset, size = header.size(), free_chunks = self.free_list.len(), "freed chunk");

    Ok(())
  }

  /// Header offset for a payload pointer, if the pointer could have come from
  /// this heap.
  fn chunk_of(
    &self,
    address: *mut u8,
  ) -> Option<usize> {
    let payload = self.arena.offset_of(address)?;

    if payload < HEADER_SIZE || payload % align!(1) != 0 {
      return None;
    }

    Some(payload - HEADER_SIZE)
  }

  fn spans_arena(
    &self,
    offset: usize,
    size: usize,
  ) -> bool {
    size >= HEADER_SIZE && size % align!(1) == 0 && offset + size <= self.arena.len()
  }

  /// Merges the free chunk at `index` with its physical neighbours.
  ///
  /// ```text
  ///   ┌──────┬───────────┬──────┐        ┌─────────────────────────┐
  ///   │ F    │ F (freed) │ F    │  ───►  │ F                       │
  ///   └──────┴───────────┴──────┘        └─────────────────────────┘
  /// ```
  fn coalesce(
    &mut self,
    index: usize,
  ) {
    let Some(offset) = self.free_list.get(index) else {
      return;
    };

    let mut size = self.arena.header(offset).size();

    if let Some(next) = self.free_list.get(index + 1) {
      if offset + size == next {
        size += self.arena.header(next).size();

        self.arena.write_header(offset, Header::new(Status::Free, size));
        self.free_list.remove(index + 1);
        self.arena.zero(next, HEADER_SIZE);

        debug!(offset, absorbed = next, size, "merged with next free chunk");
      }
    }

    let Some(previous) = index.checked_sub(1).and_then(|prev| self.free_list.get(prev)) else {
      return;
    };

    let previous_size = self.arena.header(previous).size();

    if previous + previous_size == offset {
      let merged = previous_size + size;

      self.arena.write_header(previous, Header::new(Status::Free, merged));
      self.free_list.remove(index);
      self.arena.zero(offset, HEADER_SIZE);

      debug!(offset = previous, absorbed = offset, size = merged, "merged with previous free chunk");
    }
  }

  /// Byte offset of `address` from the start of the arena, or `None` if the
  /// address lies outside it.
  pub fn offset_of(
    &self,
    address: *const u8,
  ) -> Option<usize> {
    if address.is_null() {
      return None;
    }

    self.arena.offset_of(address)
  }

  /// Walks the arena chunk by chunk from its first byte.
  pub fn chunks(&self) -> Chunks<'_> {
    Chunks {
      arena: &self.arena,
      offset: 0,
      done: false,
    }
  }

  /// Prints every chunk to standard output, five per line.
  pub fn dump(&self) -> Result<(), DumpError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    self.write_dump(&mut out)
  }

  /// Writes every chunk as `+OOOOO (S,SSSSS)`, five per line.
  ///
  /// ```text
  ///   +00000 (A,  112) +00112 (F, 3984)
  /// ```
  pub fn write_dump<W: Write>(
    &self,
    out: &mut W,
  ) -> Result<(), DumpError> {
    let mut on_row = 0;

    for chunk in self.chunks() {
      let chunk = chunk.inspect_err(|corruption| error!(%corruption, "heap dump aborted"))?;

      on_row += 1;
      let separator = if on_row % DUMP_COLUMNS == 0 { '\n' } else { ' ' };

      write!(
        out,
        "+{:05} ({},{:5}){}",
        chunk.offset,
        chunk.status.letter(),
        chunk.size,
        separator
      )?;
    }

    if on_row % DUMP_COLUMNS > 0 {
      writeln!(out)?;
    }

    Ok(())
  }

  /// Verifies that the chunks tile the arena, that the free list holds
  /// exactly the free chunks in address order, and that no two free chunks
  /// are left unmerged.
  pub fn check(&self) -> Result<(), Corruption> {
    let mut tracked = self.free_list.iter();
    let mut previous: Option<Chunk> = None;

    for chunk in self.chunks() {
      let chunk = chunk?;

      if chunk.status == Status::Free {
        if let Some(left) = previous.filter(|left| left.status == Status::Free) {
          return Err(Corruption::Unmerged {
            left: left.offset,
            right: chunk.offset,
          });
        }

        match tracked.next() {
          Some(entry) if entry == chunk.offset => {}
          Some(entry) if entry < chunk.offset => return Err(Corruption::Stale { offset: entry }),
          _ => return Err(Corruption::Untracked { offset: chunk.offset }),
        }
      }

      previous = Some(chunk);
    }

    if let Some(entry) = tracked.next() {
      return Err(Corruption::Stale { offset: entry });
    }

    let entries: Vec<usize> = self.free_list.iter().collect();
    if let Some(index) = entries.windows(2).position(|pair| pair[0] >= pair[1]) {
      return Err(Corruption::Unsorted { index: index + 1 });
    }

    Ok(())
  }

  pub fn stats(&self) -> HeapStats {
    let (free_bytes, largest_free_chunk) = self
      .free_list
      .iter()
      .map(|offset| self.arena.header(offset).size())
      .fold((0, 0), |(total, largest), size| (total + size, largest.max(size)));

    HeapStats {
      arena_size: self.arena.len(),
      free_chunks: self.free_list.len(),
      free_bytes,
      largest_free_chunk,
      free_list_capacity: self.free_list.capacity(),
    }
  }
}

/// Iterator over the chunks of a heap, see [`Heap::chunks`].
///
/// Yields one [`Corruption`] and stops if a header has an unknown status or a
/// size that would not land the walk exactly on the end of the arena.
pub struct Chunks<'heap> {
  arena: &'heap Arena,
  offset: usize,
  done: bool,
}

impl Iterator for Chunks<'_> {
  type Item = Result<Chunk, Corruption>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done || self.offset >= self.arena.len() {
      return None;
    }

    let offset = self.offset;

    let Some(header) = self.arena.try_header(offset) else {
      self.done = true;
      return Some(Err(Corruption::BadSize {
        offset,
        size: self.arena.len() - offset,
      }));
    };

    let Some(status) = header.status() else {
      self.done = true;
      return Some(Err(Corruption::BadStatus { offset, tag: header.tag() }));
    };

    let size = header.size();

    if size < HEADER_SIZE || size % align!(1) != 0 || size > self.arena.len() - offset {
      self.done = true;
      return Some(Err(Corruption::BadSize { offset, size }));
    }

    self.offset += size;

    Some(Ok(Chunk { offset, status, size }))
  }
}
