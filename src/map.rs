//! The map contract: the operation set every backend implements so callers
//! can hold a `Box<dyn Map<K, V>>` and swap implementations freely.
//!
//! Construction is backend specific (see
//! [`TableBuilder::build_map`](crate::TableBuilder::build_map)); everything
//! after that goes through this trait.

use crate::error::Result;
use core::hash::{BuildHasher, Hash};

/// What a visitor wants to happen after seeing an entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visit {
    /// Move on to the next entry.
    Continue,
    /// Remove the entry just visited, then move on.
    Remove,
    /// Stop the traversal immediately.
    Stop,
}

/// Uniform key-value map operations.
pub trait Map<K, V> {
    /// Insert `value` under `key`, replacing any entry with an equal key.
    fn put(&mut self, key: K, value: V) -> Result<()>;

    /// Value stored under `key`.
    fn get(&self, key: &K) -> Option<&V>;

    /// Mutable access to the value stored under `key`.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Remove the entry for `key`. Returns `false` if there was none.
    fn remove(&mut self, key: &K) -> bool;

    /// Number of live entries.
    fn count(&self) -> usize;

    /// Visit every entry until the visitor returns [`Visit::Stop`].
    fn for_each(&mut self, visit: &mut dyn FnMut(&K, &mut V) -> Visit);

    /// Tear the map down.
    fn destroy(self: Box<Self>);

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

/// `hashbrown` as an interchangeable backend: unordered iteration and no
/// destroy callbacks.
impl<K, V, S> Map<K, V> for hashbrown::HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn put(&mut self, key: K, value: V) -> Result<()> {
        // Drop the old key along with the old value, like the chained table.
        let _ = hashbrown::HashMap::remove(self, &key);
        let _ = self.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        hashbrown::HashMap::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        hashbrown::HashMap::get_mut(self, key)
    }

    fn remove(&mut self, key: &K) -> bool {
        hashbrown::HashMap::remove(self, key).is_some()
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn for_each(&mut self, visit: &mut dyn FnMut(&K, &mut V) -> Visit) {
        let mut stopped = false;
        self.retain(|k, v| {
            if stopped {
                return true;
            }
            match visit(k, v) {
                Visit::Continue => true,
                Visit::Remove => false,
                Visit::Stop => {
                    stopped = true;
                    true
                }
            }
        });
    }

    fn destroy(self: Box<Self>) {}
}
