//! # fitheap - A Best-Fit Arena Allocator
//!
//! This crate manages a single fixed-size region of memory (the **arena**)
//! and serves `malloc`/`free` style requests out of it. Memory is carved into
//! chunks, each prefixed by a small header, and free chunks are recombined as
//! soon as they touch so the arena does not fragment needlessly.
//!
//! ## Overview
//!
//! ```text
//!   Arena Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                               ARENA                                  │
//!   │                                                                      │
//!   │   ┌──────┬──────────────┬──────────┬──────┬──────────────────────┐   │
//!   │   │  A   │      F       │    A     │  A   │          F           │   │
//!   │   └──────┴──────────────┴──────────┴──────┴──────────────────────┘   │
//!   │   ▲      ▲                                ▲                      ▲   │
//!   │   │      │                                │                      │   │
//!   │  base    └──── free list[0]               └── free list[1]      end  │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Chunks tile the arena with no gaps. Free chunks are indexed by address.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   fitheap
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── header     - Chunk header layout and status tags
//!   ├── arena      - Zeroed backing region with offset accessors (internal)
//!   ├── free_list  - Address-ordered free chunk index (internal)
//!   ├── config     - HeapConfig size settings
//!   ├── error      - Error types
//!   └── heap       - Heap: best-fit allocation, coalescing, diagnostics
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitheap::Heap;
//!
//! let mut heap = Heap::new(4096).unwrap();
//!
//! let ptr = heap.allocate(100).unwrap();
//! unsafe { ptr.as_ptr().write_bytes(0xAB, 100) };
//!
//! heap.dump().unwrap();
//!
//! heap.deallocate(ptr.as_ptr()).unwrap();
//! assert_eq!(heap.free_chunks().count(), 1);
//! ```
//!
//! ## How It Works
//!
//! Each chunk starts with a header holding its status and its total size:
//!
//! ```text
//!   Single Chunk:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Chunk Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ tag: ALLOCATED  │  │  ┌──────────────────────────┐  │
//!   │  │ size: N + 8     │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │       8 bytes         │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! Allocation picks the smallest free chunk that fits (best fit) and splits
//! off the unused tail when it is large enough to be a chunk of its own.
//! Deallocation marks the chunk free, inserts it into the free list in
//! address order and merges it with free neighbours on either side.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Heap` is neither `Send` nor `Sync`
//! - **Fixed size**: the arena never grows or shrinks
//! - **Word alignment only**: payloads are aligned to `size_of::<usize>()`
//!
//! ## Safety
//!
//! Pointers returned by [`Heap::allocate`] are raw pointers into the arena.
//! Reading or writing through them is `unsafe`, and they dangle once the chunk
//! is freed or the heap is dropped. Invalid frees are reported as
//! [`FreeError`] instead of corrupting the heap.

pub mod align;
mod arena;
mod config;
mod error;
mod free_list;
mod header;
mod heap;

pub use config::{HeapConfig, MAX_HEAP, MIN_CHUNK, MIN_HEAP};
pub use error::{AllocError, Corruption, DumpError, FreeError, InitError};
pub use header::{HEADER_SIZE, Status};
pub use heap::{Chunk, Chunks, Heap, HeapStats};
