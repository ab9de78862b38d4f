//! Key comparison.
//!
//! A comparator decides whether two keys name the same entry. The table
//! only looks for `Ordering::Equal`; ordered backends may use the full
//! result. Any closure `Fn(&K, &K) -> Ordering` is a comparator, and its
//! captures carry whatever context the comparison needs.

use crate::hash::KeyIdentity;
use core::cmp::Ordering;

/// Three-way key comparison.
pub trait KeyCompare<K: ?Sized> {
    /// Compare `a` against `b`.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// `true` when `a` and `b` name the same entry.
    #[inline]
    fn same_key(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

impl<K: ?Sized, F> KeyCompare<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Compares keys with their `Ord` implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: ?Sized + Ord> KeyCompare<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Compares keys by identity word: handles are equal only when they point
/// at the same allocation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityOrder;

impl<K: ?Sized + KeyIdentity> KeyCompare<K> for IdentityOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.identity().cmp(&b.identity())
    }
}
