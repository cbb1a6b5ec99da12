use std::mem;

/// Number of bytes every chunk spends on its header.
///
/// ```text
///   ┌──────────────┬──────────────┬───────────────────────────┐
///   │  tag: u32    │  size: u32   │          payload          │
///   └──────────────┴──────────────┴───────────────────────────┘
///   ▲                             ▲
///   └── chunk offset              └── pointer handed to the user
/// ```
pub const HEADER_SIZE: usize = mem::size_of::<u32>() * 2;

const FREE_TAG: u32 = 0xAAAA_AAAA;
const ALLOCATED_TAG: u32 = 0x5555_5555;

/// Allocation status of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Free,
  Allocated,
}

impl Status {
  /// Bit pattern stored in the arena for this status. Neither value is zero,
  /// so a wiped header never passes for a live one.
  pub fn tag(self) -> u32 {
    match self {
      Status::Free => FREE_TAG,
      Status::Allocated => ALLOCATED_TAG,
    }
  }

  pub fn from_tag(tag: u32) -> Option<Self> {
    match tag {
      FREE_TAG => Some(Status::Free),
      ALLOCATED_TAG => Some(Status::Allocated),
      _ => None,
    }
  }

  /// Single letter used by heap dumps.
  pub fn letter(self) -> char {
    match self {
      Status::Free => 'F',
      Status::Allocated => 'A',
    }
  }
}

/// Chunk metadata as it is laid out at the start of every chunk.
///
/// The tag is kept raw so that diagnostics can report exactly what was found
/// in memory when it does not decode to a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  tag: u32,
  size: u32,
}

impl Header {
  /// Builds a header for a chunk spanning `size` bytes, header included.
  ///
  /// Callers guarantee `size` fits in 32 bits; the arena size is validated
  /// against that limit at initialization.
  pub fn new(
    status: Status,
    size: usize,
  ) -> Self {
    debug_assert!(size <= u32::MAX as usize);

    Self {
      tag: status.tag(),
      size: size as u32,
    }
  }

  pub fn status(&self) -> Option<Status> {
    Status::from_tag(self.tag)
  }

  pub fn tag(&self) -> u32 {
    self.tag
  }

  pub fn size(&self) -> usize {
    self.size as usize
  }

  pub fn is_allocated(&self) -> bool {
    self.status() == Some(Status::Allocated)
  }

  pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
    let mut bytes = [0; HEADER_SIZE];
    bytes[..4].copy_from_slice(&self.tag.to_ne_bytes());
    bytes[4..].copy_from_slice(&self.size.to_ne_bytes());
    bytes
  }

  pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
    let [t0, t1, t2, t3, s0, s1, s2, s3] = bytes;

    Self {
      tag: u32::from_ne_bytes([t0, t1, t2, t3]),
      size: u32::from_ne_bytes([s0, s1, s2, s3]),
    }
  }
}
