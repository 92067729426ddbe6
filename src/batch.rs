use std::num::NonZeroUsize;

/// Splits `items` into contiguous batches of `size`, the last one possibly
/// shorter. Empty input yields no batches.
pub fn batches<T>(items: &[T], size: NonZeroUsize) -> impl Iterator<Item = &[T]> {
    items.chunks(size.get())
}

/// Number of batches `batches` yields for `len` items.
pub fn batch_count(len: usize, size: NonZeroUsize) -> usize {
    (len + size.get() - 1) / size.get()
}
