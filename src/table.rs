//! ChainedTable: fixed bucket array with separate chaining.
//!
//! Entries live in a generational arena; each bucket is a doubly linked
//! chain threaded through the arena by key, so appending at the tail and
//! unlinking a known entry are both O(1). The bucket of an entry is
//! computed once at insertion and stored on the node.

use crate::builder::TableBuilder;
use crate::compare::{KeyCompare, NaturalOrder};
use crate::error::{MapError, Result};
use crate::hash::{BucketHash, IdentityHash};
use crate::map::{Map, Visit};
use crate::teardown::Teardown;
use core::fmt;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct EntryKey;
}

/// Callback receiving ownership of a key or value being destroyed.
pub type DestroyFn<T> = Box<dyn FnMut(T)>;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    bucket: usize,
    prev: Option<EntryKey>,
    next: Option<EntryKey>,
}

#[derive(Copy, Clone, Debug, Default)]
struct Bucket {
    head: Option<EntryKey>,
    tail: Option<EntryKey>,
    len: usize,
}

/// Hash table with a fixed power-of-two bucket count.
///
/// Use [`ChainedTable::builder`] to configure the size hint, hash
/// function, comparator, destroy callbacks and teardown policy.
pub struct ChainedTable<K, V, H = IdentityHash, C = NaturalOrder> {
    buckets: Box<[Bucket]>,
    nodes: SlotMap<EntryKey, Node<K, V>>,
    order: u32,
    hasher: H,
    compare: C,
    key_destroy: Option<DestroyFn<K>>,
    value_destroy: Option<DestroyFn<V>>,
    teardown: Teardown,
    entry_limit: Option<usize>,
}

impl<K, V> ChainedTable<K, V> {
    /// Start configuring a table.
    pub fn builder() -> TableBuilder<K, V> {
        TableBuilder::new()
    }
}

impl<K, V, H, C> ChainedTable<K, V, H, C> {
    pub(crate) fn from_builder(b: TableBuilder<K, V, H, C>) -> Result<Self> {
        let order = crate::builder::order_for(b.size_hint)?;
        let count = 1usize << order;

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(count)
            .map_err(|_| MapError::OutOfMemory { buckets: count })?;
        buckets.resize(count, Bucket::default());

        log::debug!(
            "chained table: size hint {} -> order {}, {} buckets",
            b.size_hint,
            order,
            count
        );

        Ok(Self {
            buckets: buckets.into_boxed_slice(),
            nodes: SlotMap::with_key(),
            order,
            hasher: b.hasher,
            compare: b.compare,
            key_destroy: b.key_destroy,
            value_destroy: b.value_destroy,
            teardown: b.teardown,
            entry_limit: b.entry_limit,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Base-2 logarithm of the bucket count.
    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of entries chained in bucket `index` (0 when out of range).
    pub fn bucket_len(&self, index: usize) -> usize {
        self.buckets.get(index).map_or(0, |b| b.len)
    }

    pub fn teardown(&self) -> Teardown {
        self.teardown
    }

    /// Entries in bucket-index order, oldest first within each bucket.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            buckets: self.buckets.iter(),
            cur: None,
            remaining: self.nodes.len(),
        }
    }

    /// Remove every entry, passing each to the destroy callbacks.
    pub fn clear(&mut self) {
        for b in 0..self.buckets.len() {
            while let Some(k) = self.buckets[b].head {
                let node = self.unlink(k);
                self.dispose(node);
            }
        }
        debug_assert!(self.nodes.is_empty());
    }

    /// Consume the table, applying its teardown policy.
    pub fn destroy(self) {
        drop(self);
    }

    fn link_tail(&mut self, bucket: usize, k: EntryKey) {
        let old_tail = self.buckets[bucket].tail;
        self.nodes[k].prev = old_tail;
        match old_tail {
            Some(t) => self.nodes[t].next = Some(k),
            None => self.buckets[bucket].head = Some(k),
        }
        let b = &mut self.buckets[bucket];
        b.tail = Some(k);
        b.len += 1;
    }

    fn unlink(&mut self, k: EntryKey) -> Node<K, V> {
        let node = self
            .nodes
            .remove(k)
            .expect("linked entry must be live in the arena");
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.buckets[node.bucket].head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.buckets[node.bucket].tail = node.prev,
        }
        self.buckets[node.bucket].len -= 1;
        node
    }

    // Called only once the node is out of the structure, so callbacks
    // observe a consistent table.
    fn dispose(&mut self, node: Node<K, V>) {
        let Node { key, value, .. } = node;
        match self.key_destroy.as_mut() {
            Some(f) => f(key),
            None => drop(key),
        }
        match self.value_destroy.as_mut() {
            Some(f) => f(value),
            None => drop(value),
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.buckets.len().is_power_of_two());
        assert_eq!(self.buckets.len(), 1 << self.order);
        let mut total = 0;
        for (i, b) in self.buckets.iter().enumerate() {
            let mut prev = None;
            let mut cur = b.head;
            let mut n = 0;
            while let Some(k) = cur {
                let node = &self.nodes[k];
                assert_eq!(node.bucket, i, "entry chained in the wrong bucket");
                assert_eq!(node.prev, prev, "broken back link");
                prev = Some(k);
                cur = node.next;
                n += 1;
            }
            assert_eq!(b.tail, prev, "tail does not end the chain");
            assert_eq!(b.len, n);
            total += n;
        }
        assert_eq!(total, self.nodes.len());
    }
}

impl<K, V, H, C> ChainedTable<K, V, H, C>
where
    H: BucketHash<K>,
    C: KeyCompare<K>,
{
    fn bucket_of(&self, key: &K) -> usize {
        self.hasher.bucket(key, self.order) & (self.buckets.len() - 1)
    }

    fn find_in(&self, bucket: usize, key: &K) -> Option<EntryKey> {
        let mut cur = self.buckets[bucket].head;
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if self.compare.same_key(&node.key, key) {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    /// Insert `value` under `key`. An entry with an equal key is removed
    /// first (firing the destroy callbacks) and the new entry is appended
    /// at the tail of its bucket.
    ///
    /// Fails with [`MapError::EntryLimit`] when a fresh key would exceed
    /// the configured entry limit; the table is left unchanged.
    pub fn put(&mut self, key: K, value: V) -> Result<()> {
        let bucket = self.bucket_of(&key);
        if let Some(k) = self.find_in(bucket, &key) {
            log::trace!("chained table: replacing entry in bucket {}", bucket);
            let old = self.unlink(k);
            self.dispose(old);
        }
        if let Some(limit) = self.entry_limit {
            if self.nodes.len() >= limit {
                log::warn!("chained table: entry limit {} reached, put dropped", limit);
                return Err(MapError::EntryLimit { limit });
            }
        }
        let k = self.nodes.insert(Node {
            key,
            value,
            bucket,
            prev: None,
            next: None,
        });
        self.link_tail(bucket, k);
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let k = self.find_in(self.bucket_of(key), key)?;
        Some(&self.nodes[k].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let k = self.find_in(self.bucket_of(key), key)?;
        Some(&mut self.nodes[k].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_in(self.bucket_of(key), key).is_some()
    }

    /// Remove the entry for `key`, firing the destroy callbacks.
    /// Returns `false` if no entry matched.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.find_in(self.bucket_of(key), key) {
            Some(k) => {
                let node = self.unlink(k);
                self.dispose(node);
                true
            }
            None => false,
        }
    }

    /// Visit entries in iteration order. The visitor may remove the entry
    /// it is looking at ([`Visit::Remove`]) or end the walk
    /// ([`Visit::Stop`]).
    pub fn for_each<F>(&mut self, mut visit: F)
    where
        F: FnMut(&K, &mut V) -> Visit,
    {
        for b in 0..self.buckets.len() {
            let mut cur = self.buckets[b].head;
            while let Some(k) = cur {
                let node = &mut self.nodes[k];
                cur = node.next;
                match visit(&node.key, &mut node.value) {
                    Visit::Continue => {}
                    Visit::Remove => {
                        let node = self.unlink(k);
                        self.dispose(node);
                    }
                    Visit::Stop => return,
                }
            }
        }
    }
}

impl<K, V, H, C> Map<K, V> for ChainedTable<K, V, H, C>
where
    H: BucketHash<K>,
    C: KeyCompare<K>,
{
    fn put(&mut self, key: K, value: V) -> Result<()> {
        ChainedTable::put(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        ChainedTable::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        ChainedTable::get_mut(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        ChainedTable::remove(self, key)
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn for_each(&mut self, visit: &mut dyn FnMut(&K, &mut V) -> Visit) {
        ChainedTable::for_each(self, visit)
    }

    fn destroy(self: Box<Self>) {
        ChainedTable::destroy(*self)
    }

    fn contains_key(&self, key: &K) -> bool {
        ChainedTable::contains_key(self, key)
    }
}

impl<K, V, H, C> Drop for ChainedTable<K, V, H, C> {
    fn drop(&mut self) {
        match self.teardown {
            Teardown::Purge => self.clear(),
            Teardown::Release => {
                if !self.nodes.is_empty()
                    && (self.key_destroy.is_some() || self.value_destroy.is_some())
                {
                    log::warn!(
                        "chained table: released with {} live entries, destroy callbacks skipped",
                        self.nodes.len()
                    );
                }
            }
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H, C> fmt::Debug for ChainedTable<K, V, H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, H, C> IntoIterator for &'a ChainedTable<K, V, H, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`ChainedTable`].
pub struct Iter<'a, K, V> {
    nodes: &'a SlotMap<EntryKey, Node<K, V>>,
    buckets: core::slice::Iter<'a, Bucket>,
    cur: Option<EntryKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let node = &self.nodes[k];
                self.cur = node.next;
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.cur = self.buckets.next()?.head;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::StrHash;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn str_table<V>() -> ChainedTable<String, V, StrHash> {
        ChainedTable::builder().hasher(StrHash).build().unwrap()
    }

    // Every key lands in bucket `k % 8`.
    fn mod8(k: &u32, _order: u32) -> usize {
        (*k % 8) as usize
    }

    /// Invariant: size hints round up to a power of two, never below 8.
    #[test]
    fn bucket_count_from_size_hint() {
        for (hint, buckets) in [(0, 8), (1, 8), (8, 8), (9, 16), (100, 128), (128, 128)] {
            let t: ChainedTable<usize, ()> =
                ChainedTable::builder().size_hint(hint).build().unwrap();
            assert_eq!(t.bucket_count(), buckets, "hint {}", hint);
            assert_eq!(1 << t.order(), buckets);
        }
    }

    /// Scenario: put/get/remove/count/iterate on string keys.
    #[test]
    fn basic_scenario() {
        let mut t: ChainedTable<String, i32, StrHash> = ChainedTable::builder()
            .size_hint(100)
            .hasher(StrHash)
            .build()
            .unwrap();
        assert_eq!(t.bucket_count(), 128);
        t.put("a".into(), 1).unwrap();
        t.put("b".into(), 2).unwrap();
        assert_eq!(t.get(&"a".into()), Some(&1));
        assert!(t.remove(&"a".into()));
        assert_eq!(t.get(&"a".into()), None);
        assert_eq!(t.len(), 1);
        let all: Vec<_> = t.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(all, vec![("b".to_string(), 2)]);
        t.check_invariants();
    }

    /// Invariant: replacing a key keeps the count and fires callbacks once
    /// for the displaced key and value.
    #[test]
    fn replace_fires_destroy_once() {
        let keys = Rc::new(RefCell::new(Vec::new()));
        let values = Rc::new(RefCell::new(Vec::new()));
        let (kc, vc) = (keys.clone(), values.clone());
        let mut t: ChainedTable<String, i32, StrHash> = ChainedTable::builder()
            .hasher(StrHash)
            .on_key_destroy(move |k| kc.borrow_mut().push(k))
            .on_value_destroy(move |v| vc.borrow_mut().push(v))
            .build()
            .unwrap();

        t.put("x".into(), 1).unwrap();
        t.put("x".into(), 2).unwrap();
        assert_eq!(*values.borrow(), vec![1]);
        assert_eq!(*keys.borrow(), vec!["x".to_string()]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(&"x".into()), Some(&2));
        t.check_invariants();
    }

    /// Invariant: removing an absent key is a no-op returning false.
    #[test]
    fn remove_absent_key() {
        let mut t = str_table::<i32>();
        t.put("present".into(), 1).unwrap();
        assert!(!t.remove(&"absent".into()));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: iteration is bucket-major, insertion-order-minor, and
    /// stable across repeated walks.
    #[test]
    fn iteration_order() {
        let mut t: ChainedTable<u32, (), _> =
            ChainedTable::builder().hasher(mod8).build().unwrap();
        for k in [9, 2, 1, 17, 7] {
            t.put(k, ()).unwrap();
        }
        let order: Vec<u32> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec![9, 1, 17, 2, 7]);
        let again: Vec<u32> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, again);
        assert_eq!(t.bucket_len(1), 3);
        assert_eq!(t.bucket_len(2), 1);
        assert_eq!(t.bucket_len(99), 0);
        assert_eq!(t.iter().len(), 5);
    }

    /// Invariant: a replaced key moves to the tail of its bucket.
    #[test]
    fn replacement_appends_at_tail() {
        let mut t: ChainedTable<u32, u32, _> =
            ChainedTable::builder().hasher(mod8).build().unwrap();
        t.put(1, 10).unwrap();
        t.put(9, 90).unwrap();
        t.put(1, 11).unwrap();
        let order: Vec<_> = t.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(order, vec![(9, 90), (1, 11)]);
        t.check_invariants();
    }

    /// Invariant: collisions resolve by comparator, and unlinking from the
    /// head, middle and tail of a chain keeps it intact.
    #[test]
    fn unlink_from_every_chain_position() {
        let mut t: ChainedTable<u32, u32, _> = ChainedTable::builder()
            .hasher(|_: &u32, _: u32| 0usize)
            .build()
            .unwrap();
        for k in 0..5 {
            t.put(k, k * 10).unwrap();
        }
        assert_eq!(t.bucket_len(0), 5);
        assert!(t.remove(&2));
        t.check_invariants();
        assert!(t.remove(&0));
        t.check_invariants();
        assert!(t.remove(&4));
        t.check_invariants();
        let rest: Vec<_> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(rest, vec![1, 3]);
        assert_eq!(t.get(&3), Some(&30));
    }

    /// Invariant: the visitor may remove the current entry, and stopping
    /// ends the walk without touching later buckets.
    #[test]
    fn for_each_remove_and_stop() {
        let removed = Rc::new(RefCell::new(Vec::new()));
        let r = removed.clone();
        let mut t: ChainedTable<u32, u32, _> = ChainedTable::builder()
            .hasher(mod8)
            .on_value_destroy(move |v| r.borrow_mut().push(v))
            .build()
            .unwrap();
        for k in [1, 9, 17, 2, 3] {
            t.put(k, k).unwrap();
        }

        t.for_each(|k, _| if *k == 9 { Visit::Remove } else { Visit::Continue });
        assert_eq!(*removed.borrow(), vec![9]);
        assert_eq!(t.len(), 4);
        t.check_invariants();

        let mut seen = Vec::new();
        t.for_each(|k, _| {
            seen.push(*k);
            if *k == 17 {
                Visit::Stop
            } else {
                Visit::Continue
            }
        });
        assert_eq!(seen, vec![1, 17]);

        t.for_each(|_, v| {
            *v += 100;
            Visit::Remove
        });
        assert!(t.is_empty());
        assert_eq!(*removed.borrow(), vec![9, 101, 117, 102, 103]);
        t.check_invariants();
    }

    /// Invariant: the entry limit rejects fresh keys without side effects
    /// but always admits replacements.
    #[test]
    fn entry_limit_rejects_fresh_keys_only() {
        let mut t: ChainedTable<String, i32, StrHash> = ChainedTable::builder()
            .hasher(StrHash)
            .entry_limit(2)
            .build()
            .unwrap();
        t.put("a".into(), 1).unwrap();
        t.put("b".into(), 2).unwrap();
        assert_eq!(
            t.put("c".into(), 3),
            Err(MapError::EntryLimit { limit: 2 })
        );
        assert_eq!(t.len(), 2);
        assert!(!t.contains_key(&"c".into()));
        t.put("a".into(), 10).unwrap();
        assert_eq!(t.get(&"a".into()), Some(&10));
        assert_eq!(t.len(), 2);
    }

    /// Invariant: `get_mut` edits in place and `clear` purges through the
    /// callbacks.
    #[test]
    fn get_mut_and_clear() {
        let calls = Rc::new(RefCell::new(0));
        let c = calls.clone();
        let mut t: ChainedTable<String, i32, StrHash> = ChainedTable::builder()
            .hasher(StrHash)
            .on_value_destroy(move |_| *c.borrow_mut() += 1)
            .build()
            .unwrap();
        t.put("k".into(), 1).unwrap();
        t.put("j".into(), 2).unwrap();
        *t.get_mut(&"k".into()).unwrap() = 5;
        assert_eq!(t.get(&"k".into()), Some(&5));
        assert!(t.get_mut(&"missing".into()).is_none());
        t.clear();
        assert!(t.is_empty());
        assert_eq!(*calls.borrow(), 2);
        t.check_invariants();
    }

    #[test]
    fn debug_lists_entries() {
        let mut t: ChainedTable<u32, &str, _> =
            ChainedTable::builder().hasher(mod8).build().unwrap();
        t.put(2, "two").unwrap();
        t.put(1, "one").unwrap();
        assert_eq!(format!("{:?}", t), r#"{1: "one", 2: "two"}"#);
    }
}
