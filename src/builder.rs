//! TableBuilder: configuration and construction of a [`ChainedTable`].

use crate::compare::{KeyCompare, NaturalOrder};
use crate::error::{MapError, Result};
use crate::hash::{BucketHash, IdentityHash, MAX_ORDER, MIN_ORDER};
use crate::map::Map;
use crate::table::{ChainedTable, DestroyFn};
use crate::teardown::Teardown;

/// Order (log2 of the bucket count) for a size hint: the hint rounded up
/// to a power of two, with a floor of 8 buckets.
pub fn order_for(size_hint: usize) -> Result<u32> {
    let count = size_hint
        .max(1)
        .checked_next_power_of_two()
        .ok_or(MapError::CapacityOverflow { size_hint })?;
    let order = count.trailing_zeros().max(MIN_ORDER);
    if order > MAX_ORDER {
        return Err(MapError::CapacityOverflow { size_hint });
    }
    Ok(order)
}

/// Builder for [`ChainedTable`].
///
/// Defaults: size hint 0 (8 buckets), [`IdentityHash`], [`NaturalOrder`],
/// no destroy callbacks, [`Teardown::Release`], no entry limit.
pub struct TableBuilder<K, V, H = IdentityHash, C = NaturalOrder> {
    pub(crate) size_hint: usize,
    pub(crate) hasher: H,
    pub(crate) compare: C,
    pub(crate) key_destroy: Option<DestroyFn<K>>,
    pub(crate) value_destroy: Option<DestroyFn<V>>,
    pub(crate) teardown: Teardown,
    pub(crate) entry_limit: Option<usize>,
}

impl<K, V> TableBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            size_hint: 0,
            hasher: IdentityHash,
            compare: NaturalOrder,
            key_destroy: None,
            value_destroy: None,
            teardown: Teardown::default(),
            entry_limit: None,
        }
    }
}

impl<K, V> Default for TableBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H, C> TableBuilder<K, V, H, C> {
    /// Expected number of entries. Fixes the bucket count for the lifetime
    /// of the table.
    pub fn size_hint(mut self, size_hint: usize) -> Self {
        self.size_hint = size_hint;
        self
    }

    /// Replace the bucket hash function.
    pub fn hasher<H2>(self, hasher: H2) -> TableBuilder<K, V, H2, C> {
        TableBuilder {
            size_hint: self.size_hint,
            hasher,
            compare: self.compare,
            key_destroy: self.key_destroy,
            value_destroy: self.value_destroy,
            teardown: self.teardown,
            entry_limit: self.entry_limit,
        }
    }

    /// Replace the key comparator.
    pub fn compare<C2>(self, compare: C2) -> TableBuilder<K, V, H, C2> {
        TableBuilder {
            size_hint: self.size_hint,
            hasher: self.hasher,
            compare,
            key_destroy: self.key_destroy,
            value_destroy: self.value_destroy,
            teardown: self.teardown,
            entry_limit: self.entry_limit,
        }
    }

    /// Called with each key as its entry is removed or replaced.
    pub fn on_key_destroy(mut self, f: impl FnMut(K) + 'static) -> Self {
        self.key_destroy = Some(Box::new(f));
        self
    }

    /// Called with each value as its entry is removed or replaced.
    pub fn on_value_destroy(mut self, f: impl FnMut(V) + 'static) -> Self {
        self.value_destroy = Some(Box::new(f));
        self
    }

    pub fn teardown(mut self, teardown: Teardown) -> Self {
        self.teardown = teardown;
        self
    }

    /// Cap the number of live entries; `put` of a fresh key beyond it fails
    /// with [`MapError::EntryLimit`].
    pub fn entry_limit(mut self, limit: usize) -> Self {
        self.entry_limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<ChainedTable<K, V, H, C>>
    where
        H: BucketHash<K>,
        C: KeyCompare<K>,
    {
        ChainedTable::from_builder(self)
    }

    /// Build the table behind the backend-agnostic [`Map`] contract.
    pub fn build_map(self) -> Result<Box<dyn Map<K, V>>>
    where
        K: 'static,
        V: 'static,
        H: BucketHash<K> + 'static,
        C: KeyCompare<K> + 'static,
    {
        Ok(Box::new(self.build()?))
    }
}
