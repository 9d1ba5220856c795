//! ChainTable: separate chaining over a slotmap entry arena, with growth
//! triggered per write by collision depth or bucket fill.

use crate::reentrancy::ReentryCheck;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Bucket count used when none is given, or when a caller asks for zero.
pub const DEFAULT_CAPACITY: usize = 10;

/// A chain longer than this after an insert triggers growth.
pub const MAX_COLLISIONS: usize = 3;

/// A used-bucket ratio above this after an insert triggers growth.
pub const MAX_FILL_FACTOR: f64 = 0.8;

/// Lookup miss. `get` reports absence as an error rather than minting a
/// default value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyNotFound;

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl std::error::Error for KeyNotFound {}

/// Bucket index outside `[0, capacity)`, from `bucket_size`/`bucket_iter`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IndexOutOfRange {
    pub index: usize,
    pub capacity: usize,
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bucket index {} out of range for capacity {}",
            self.index, self.capacity
        )
    }
}

impl std::error::Error for IndexOutOfRange {}

// One arena slot. `next` is the chain link; the hash is computed once at
// insert and reused for every scan and rehash, so `K: Hash` never runs
// again after insertion.
#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<DefaultKey>,
}

// Chain head plus its length, kept in one struct so the two can never
// drift apart positionally.
#[derive(Clone, Debug, Default)]
struct Bucket {
    head: Option<DefaultKey>,
    len: usize,
}

/// A hash table resolving collisions by separate chaining.
///
/// Entries live in a slotmap arena; each bucket stores an optional head
/// slot and each entry an optional next slot, so chains are index links
/// rather than owned pointers. Insertion links new entries at the chain
/// head (O(1)); a bucket scanning longer than [`MAX_COLLISIONS`] or a
/// used-bucket ratio above [`MAX_FILL_FACTOR`] after an insert doubles the
/// bucket count and relinks every entry before `set` returns. Capacity
/// never shrinks.
///
/// Single-threaded by design: mutation takes `&mut self`, and the table is
/// move-only (no `Clone`). Iterators borrow the table, so the borrow
/// checker rules out mutation while a traversal is live. The table is
/// `Send` but never `Sync`, in release builds too:
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<chain_hashmap::ChainTable<String, i32>>();
/// ```
pub struct ChainTable<K, V, S = RandomState> {
    hasher: S,
    buckets: Vec<Bucket>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    used_buckets: usize,
    reentrancy: ReentryCheck,
}

impl<K, V> ChainTable<K, V>
where
    K: Eq + Hash,
{
    /// Table with [`DEFAULT_CAPACITY`] buckets and a random hasher.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Table with `capacity` buckets; zero is coerced to the default.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V> Default for ChainTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            hasher,
            buckets: vec![Bucket::default(); capacity],
            slots: SlotMap::with_key(),
            used_buckets: 0,
            reentrancy: ReentryCheck::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        let mut h = self.hasher.build_hasher();
        q.hash(&mut h);
        h.finish()
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn fill_factor(&self) -> f64 {
        self.used_buckets as f64 / self.buckets.len() as f64
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current bucket count. Non-decreasing over the table's lifetime.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entry count of one bucket, or [`IndexOutOfRange`].
    pub fn bucket_size(&self, index: usize) -> Result<usize, IndexOutOfRange> {
        match self.buckets.get(index) {
            Some(b) => Ok(b.len),
            None => Err(IndexOutOfRange {
                index,
                capacity: self.buckets.len(),
            }),
        }
    }

    /// Borrow the value for `key`, or [`KeyNotFound`]. Does not mutate.
    pub fn get<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        let mut cur = self.buckets[self.bucket_of(hash)].head;
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && e.key.borrow() == key {
                return Ok(&e.value);
            }
            cur = e.next;
        }
        Err(KeyNotFound)
    }

    /// Mutably borrow the value for `key`, or [`KeyNotFound`].
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        let mut cur = self.buckets[self.bucket_of(hash)].head;
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && e.key.borrow() == key {
                return Ok(&mut self.slots[k].value);
            }
            cur = e.next;
        }
        Err(KeyNotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_ok()
    }

    /// Insert or update.
    ///
    /// An existing key has its value replaced in place; chain position,
    /// entry count and bucket occupancy are unchanged. A new key is linked
    /// at the head of its chain. If the written bucket's chain then
    /// exceeds [`MAX_COLLISIONS`], or the used-bucket ratio exceeds
    /// [`MAX_FILL_FACTOR`], the table grows before this call returns.
    pub fn set(&mut self, key: K, value: V) {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        let idx = self.bucket_of(hash);

        let mut cur = self.buckets[idx].head;
        while let Some(k) = cur {
            let e = &mut self.slots[k];
            if e.hash == hash && e.key == key {
                e.value = value;
                return;
            }
            cur = e.next;
        }

        let next = self.buckets[idx].head;
        let k = self.slots.insert(Entry {
            key,
            value,
            hash,
            next,
        });
        let bucket = &mut self.buckets[idx];
        bucket.head = Some(k);
        bucket.len += 1;
        if bucket.len == 1 {
            self.used_buckets += 1;
        }
        let over_depth = bucket.len > MAX_COLLISIONS;

        if over_depth || self.fill_factor() > MAX_FILL_FACTOR {
            // grow() retakes &mut self; the guard must release first.
            drop(_g);
            self.grow();
        }
    }

    /// Unlink and drop the entry for `key`, returning its value if one was
    /// present. Never shrinks capacity and never triggers growth.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        let idx = self.bucket_of(hash);

        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.buckets[idx].head;
        let found = loop {
            let k = cur?;
            let e = &self.slots[k];
            if e.hash == hash && e.key.borrow() == key {
                break k;
            }
            prev = cur;
            cur = e.next;
        };

        // Chain links always name live slots.
        let entry = self.slots.remove(found)?;
        match prev {
            Some(p) => self.slots[p].next = entry.next,
            None => self.buckets[idx].head = entry.next,
        }
        let bucket = &mut self.buckets[idx];
        bucket.len -= 1;
        if bucket.len == 0 {
            self.used_buckets -= 1;
        }
        Some(entry.value)
    }

    /// Traverse one bucket's chain, head to tail (most recently inserted
    /// first), or [`IndexOutOfRange`]. The iterator borrows the table, so
    /// mutation during traversal is rejected at compile time.
    pub fn bucket_iter(&self, index: usize) -> Result<BucketIter<'_, K, V>, IndexOutOfRange> {
        match self.buckets.get(index) {
            Some(b) => Ok(BucketIter {
                slots: &self.slots,
                cur: b.head,
            }),
            None => Err(IndexOutOfRange {
                index,
                capacity: self.buckets.len(),
            }),
        }
    }

    /// Traverse every entry, in ascending bucket order and head-to-tail
    /// within each chain.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.buckets,
            slots: &self.slots,
            next_bucket: 0,
            cur: None,
        }
    }

    // Doubles the bucket count and relinks every entry. Entries keep their
    // arena slots; only chain links and bucket heads are rewritten. Old
    // buckets are drained in ascending index order, each chain head to
    // tail, and each entry is relinked at the head of its new chain, so
    // within a new bucket entries end up in reverse of their old
    // within-bucket order.
    fn grow(&mut self) {
        let old_cap = self.buckets.len();
        // Doubling overflows only at absurd capacities; fall back to +1.
        let new_cap = old_cap.checked_mul(2).unwrap_or(old_cap + 1);

        let old_buckets = std::mem::replace(&mut self.buckets, vec![Bucket::default(); new_cap]);
        self.used_buckets = 0;

        for old in &old_buckets {
            let mut cur = old.head;
            while let Some(k) = cur {
                let e = &mut self.slots[k];
                cur = e.next;
                let idx = (e.hash % new_cap as u64) as usize;
                let target = &mut self.buckets[idx];
                if target.len == 0 {
                    self.used_buckets += 1;
                }
                e.next = target.head;
                target.head = Some(k);
                target.len += 1;
            }
        }
    }
}

/// Forward-only, single-pass traversal of one bucket's chain.
pub struct BucketIter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let e = &self.slots[k];
        self.cur = e.next;
        Some((&e.key, &e.value))
    }
}

/// Whole-table traversal: ascending bucket order, chains head to tail.
pub struct Iter<'a, K, V> {
    buckets: &'a [Bucket],
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    next_bucket: usize,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let e = &self.slots[k];
                self.cur = e.next;
                return Some((&e.key, &e.value));
            }
            let b = self.buckets.get(self.next_bucket)?;
            self.next_bucket += 1;
            self.cur = b.head;
        }
    }
}
