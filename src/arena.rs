use std::ptr::{self, NonNull};

use crate::{
  error::InitError,
  header::{HEADER_SIZE, Header},
};

/// The single zero-filled region a heap carves its chunks from.
///
/// Memory comes from the C runtime with `calloc(3)` and goes back with
/// `free(3)` when the arena is dropped. Every access goes through a byte
/// offset that is checked against the arena length, and no reference to the
/// whole buffer is ever created, so payload pointers handed out to users stay
/// valid while headers around them are rewritten.
pub struct Arena {
  base: NonNull<u8>,
  len: usize,
}

impl Arena {
  pub fn zeroed(len: usize) -> Result<Self, InitError> {
    let address = unsafe { libc::calloc(len, 1) } as *mut u8;

    NonNull::new(address)
      .map(|base| Self { base, len })
      .ok_or(InitError::ArenaUnavailable { size: len })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  #[cfg(test)]
  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  /// Byte offset of `address` from the arena base, if it lies inside
  /// `[base, base + len)`.
  pub fn offset_of(
    &self,
    address: *const u8,
  ) -> Option<usize> {
    let start = self.base.as_ptr() as usize;
    let address = address as usize;

    (start..start + self.len).contains(&address).then(|| address - start)
  }

  /// Reads the header at `offset`, or `None` when a header would not fit
  /// between `offset` and the end of the arena.
  pub fn try_header(
    &self,
    offset: usize,
  ) -> Option<Header> {
    if !self.fits(offset, HEADER_SIZE) {
      return None;
    }

    let bytes = unsafe {
      self
        .base
        .as_ptr()
        .add(offset)
        .cast::<[u8; HEADER_SIZE]>()
        .read_unaligned()
    };

    Some(Header::from_bytes(bytes))
  }

  /// Reads the header of a chunk the heap already tracks.
  ///
  /// # Panics
  ///
  /// Panics if `offset` is out of bounds, which means the heap's own
  /// bookkeeping is broken.
  pub fn header(
    &self,
    offset: usize,
  ) -> Header {
    match self.try_header(offset) {
      Some(header) => header,
      None => panic!("chunk header at offset {offset} is outside a {} byte arena", self.len),
    }
  }

  pub fn write_header(
    &mut self,
    offset: usize,
    header: Header,
  ) {
    assert!(
      self.fits(offset, HEADER_SIZE),
      "chunk header at offset {offset} is outside a {} byte arena",
      self.len
    );

    unsafe {
      self
        .base
        .as_ptr()
        .add(offset)
        .cast::<[u8; HEADER_SIZE]>()
        .write_unaligned(header.to_bytes());
    }
  }

  /// Fills `[offset, offset + len)` with zeroes.
  pub fn zero(
    &mut self,
    offset: usize,
    len: usize,
  ) {
    assert!(self.fits(offset, len), "cannot zero {len} bytes at offset {offset}");

    unsafe { ptr::write_bytes(self.base.as_ptr().add(offset), 0, len) };
  }

  /// Pointer to the byte at `offset`.
  pub fn pointer(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset < self.len, "offset {offset} is outside a {} byte arena", self.len);

    unsafe { self.base.add(offset) }
  }

  fn fits(
    &self,
    offset: usize,
    len: usize,
  ) -> bool {
    offset.checked_add(len).is_some_and(|end| end <= self.len)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { libc::free(self.base.as_ptr().cast()) };
  }
}
