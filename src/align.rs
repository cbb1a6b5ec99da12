/// Rounds the given size up to the machine word size.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use fitheap::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::std::mem::size_of::<usize>())
  };
}

/// Rounds the given size up to the next multiple of `$align`, which must be a
/// power of two.
///
/// ```rust
/// use fitheap::align_to;
///
/// assert_eq!(align_to!(33, 32), 64);
/// assert_eq!(align_to!(64, 32), 64);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}
