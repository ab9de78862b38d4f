//! chained-map: a fixed-capacity hash table with separate chaining,
//! exposed behind a map contract so callers can swap backends.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, predictable associative container whose bucket array
//!   is sized once and never rehashed.
//! - Layers:
//!   - `hash`: FNV-based functions reducing a key to an `order`-bit bucket
//!     index (`StrHash`, `ByteHash`, `IdentityHash`, or any closure).
//!   - `ChainedTable<K, V, H, C>`: the table. Entries sit in a generational
//!     arena; every bucket is a doubly linked chain threaded through it.
//!   - `Map<K, V>`: object-safe contract (put/get/remove/count/for_each/
//!     destroy). `TableBuilder::build_map` is the constructor side of it.
//!
//! Constraints
//! - Bucket count is `max(8, next_power_of_two(size_hint))`, fixed for life.
//! - An entry's bucket is computed once at insertion and stored.
//! - At most one entry per key as decided by the comparator; `put` on an
//!   existing key destroys the old entry and appends a new one at the tail.
//! - Iteration is bucket-index major, insertion order minor.
//! - Single-threaded: no internal synchronization. Destroy callbacks are
//!   boxed `FnMut` without `Send`, so tables carrying them are `!Send`.
//!
//! Destroy callbacks
//! - Fired exactly once per entry on removal, replacement, `clear`, or a
//!   visitor returning `Visit::Remove`, always after the entry has been
//!   unlinked.
//! - Entries still present at destroy time follow the `Teardown` policy:
//!   `Release` skips the callbacks (caller must empty the table first),
//!   `Purge` runs them.
//!
//! Failure model
//! - Construction fails with `MapError::OutOfMemory` when the bucket array
//!   cannot be allocated, or `CapacityOverflow` for unsupported hints.
//! - `put` fails with `MapError::EntryLimit` when an optional entry budget
//!   is exhausted; nothing is inserted and the count is unchanged.
//! - Missing keys are `None`/`false`, never errors.

mod builder;
pub mod compare;
mod error;
pub mod hash;
mod map;
mod table;
mod table_proptest;
mod teardown;

// Public surface
pub use builder::{order_for, TableBuilder};
pub use compare::{IdentityOrder, KeyCompare, NaturalOrder};
pub use error::{MapError, Result};
pub use hash::{BucketHash, ByteHash, IdentityHash, StrHash};
pub use map::{Map, Visit};
pub use table::{ChainedTable, DestroyFn, Iter};
pub use teardown::Teardown;
