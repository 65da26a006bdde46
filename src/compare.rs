//! Key ordering strategies.

use std::cmp::Ordering;

/// Total order over keys used to navigate a [`SplayTree`](crate::SplayTree).
///
/// `Ordering::Equal` means "same key": it is what rejects a duplicate insertion
/// and what ends a successful lookup.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Default comparator: lexicographic byte order.
///
/// Most symbol-table keys differ in their first byte, so that byte is compared
/// on its own before falling back to the full slice comparison.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteOrder;

impl<K: AsRef<[u8]> + ?Sized> Comparator<K> for ByteOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        byte_order(a.as_ref(), b.as_ref())
    }
}

#[inline]
pub(crate) fn byte_order(a: &[u8], b: &[u8]) -> Ordering {
    match (a.first(), b.first()) {
        (Some(x), Some(y)) if x != y => x.cmp(y),
        _ => a.cmp(b),
    }
}
