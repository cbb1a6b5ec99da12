use std::{fmt::Display, process, ptr::NonNull};

use fitheap::{Heap, HeapConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Reports an unrecoverable usage error and exits, the way a C program would
/// after a bad `free`.
fn fatal(err: impl Display) -> ! {
  error!("{err}");
  eprintln!("fatal: {err}");
  process::exit(1);
}

/// Prints the heap layout, aborting if the walk finds a corrupted header.
fn show(
  heap: &Heap,
  label: &str,
) {
  println!("\n[{label}]");
  if let Err(err) = heap.dump() {
    fatal(err);
  }
}

fn allocate(
  heap: &mut Heap,
  size: usize,
) -> Option<NonNull<u8>> {
  match heap.allocate(size) {
    Ok(ptr) => {
      println!(
        "allocate({size}) -> +{:05}",
        heap.offset_of(ptr.as_ptr()).unwrap_or_default()
      );
      Some(ptr)
    }
    Err(err) => {
      println!("allocate({size}) -> null ({err})");
      None
    }
  }
}

fn free(
  heap: &mut Heap,
  ptr: NonNull<u8>,
) {
  let offset = heap.offset_of(ptr.as_ptr()).unwrap_or_default();

  match heap.deallocate(ptr.as_ptr()) {
    Ok(()) => println!("free(+{offset:05})"),
    Err(err) => fatal(err),
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let size = std::env::args()
    .nth(1)
    .and_then(|arg| arg.parse().ok())
    .unwrap_or(4096);

  let mut heap = match Heap::with_config(HeapConfig::new(size)) {
    Ok(heap) => heap,
    Err(err) => fatal(err),
  };

  info!(size = heap.size(), "heap ready");
  show(&heap, "initial");

  // --------------------------------------------------------------------
  // 1) A handful of allocations, each split off the front of the arena.
  // --------------------------------------------------------------------
  let a = allocate(&mut heap, 100);
  let b = allocate(&mut heap, 12);
  let c = allocate(&mut heap, 250);
  let d = allocate(&mut heap, 8);
  show(&heap, "after four allocations");

  if let Some(c) = c {
    unsafe { c.as_ptr().write_bytes(0xAB, 250) };
  }

  // --------------------------------------------------------------------
  // 2) Requests that cannot be served leave the heap untouched.
  // --------------------------------------------------------------------
  let too_large = heap.size() + 1;
  allocate(&mut heap, 0);
  allocate(&mut heap, too_large);

  // --------------------------------------------------------------------
  // 3) Free non-adjacent chunks, then the one between them: the three
  //    free chunks merge into one.
  // --------------------------------------------------------------------
  for ptr in [a, c].into_iter().flatten() {
    free(&mut heap, ptr);
  }
  show(&heap, "after freeing a and c");

  if let Some(b) = b {
    free(&mut heap, b);
  }
  show(&heap, "after freeing b");

  // --------------------------------------------------------------------
  // 4) Best fit: the hole left at the front beats the larger tail.
  // --------------------------------------------------------------------
  let e = allocate(&mut heap, 300);
  show(&heap, "after best-fit allocation");

  let stats = heap.stats();
  println!(
    "\nfree chunks = {}, free bytes = {}, largest free chunk = {}",
    stats.free_chunks, stats.free_bytes, stats.largest_free_chunk
  );

  for ptr in [d, e].into_iter().flatten() {
    free(&mut heap, ptr);
  }
  show(&heap, "after freeing everything");

  // --------------------------------------------------------------------
  // 5) Freeing the same chunk twice is a fatal usage error.
  // --------------------------------------------------------------------
  if let Some(d) = d {
    println!("\nfreeing d a second time...");
    free(&mut heap, d);
  }

  heap.teardown();
}
