// ChainTable integration suite.
//
// Each test documents the behavior being verified and which invariants
// are assumed or asserted. The core invariants exercised:
// - Round-trip: values inserted via set are returned by get until
//   overwritten or removed.
// - Overwrite: set on an existing key replaces in place, len unchanged.
// - Deletion: remove unlinks exactly one entry and updates counters.
// - Growth: triggered synchronously inside the set call that crosses a
//   threshold; capacity only ever doubles and never shrinks.
// - Conservation: rehashing reorganizes chains without gaining or losing
//   any (key, value) pair.
// - Chain order: head insertion makes per-bucket traversal newest-first;
//   one rehash reverses the surviving chain.
use chain_hashmap::{ChainTable, IndexOutOfRange, KeyNotFound, DEFAULT_CAPACITY, MAX_COLLISIONS};
use std::hash::{BuildHasher, Hasher};

// Forces every key into bucket 0 to make chain behavior deterministic.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Maps u64 keys straight to their own value, so bucket targets are
// key % capacity and the fill-factor trigger can be scripted exactly.
#[derive(Clone, Default)]
struct IdentityBuildHasher;
struct IdentityHasher(u64);
impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher(0)
    }
}
impl Hasher for IdentityHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

fn chain_keys(t: &ChainTable<String, i32, ConstBuildHasher>, bucket: usize) -> Vec<String> {
    t.bucket_iter(bucket)
        .expect("bucket index in range")
        .map(|(k, _)| k.clone())
        .collect()
}

// Test: round-trip and overwrite semantics.
// Verifies: get returns the inserted value; a second set on the same key
// replaces the value without changing len.
#[test]
fn round_trip_and_overwrite() {
    let mut t = ChainTable::new();
    t.set("alpha".to_string(), 1);
    t.set("beta".to_string(), 2);
    assert_eq!(t.get("alpha"), Ok(&1));
    assert_eq!(t.get("beta"), Ok(&2));
    assert_eq!(t.len(), 2);

    t.set("alpha".to_string(), 10);
    assert_eq!(t.len(), 2);
    assert_eq!(t.get("alpha"), Ok(&10));
}

// Test: lookup miss is an error, not a default value.
// A failed get must also never insert a default entry as a side effect.
#[test]
fn get_missing_is_key_not_found() {
    let t: ChainTable<String, i32> = ChainTable::with_capacity(10);
    assert_eq!(t.get("missing"), Err(KeyNotFound));
    assert!(!t.contains_key("missing"));
    assert_eq!(t.len(), 0, "a failed get must not insert anything");
}

// Test: bucket accessors reject out-of-range indices.
// A negative index is unrepresentable with usize, so the open edge is
// index == capacity (and beyond).
#[test]
fn bucket_index_out_of_range() {
    let t: ChainTable<String, i32> = ChainTable::with_capacity(10);
    assert_eq!(t.bucket_size(9), Ok(0));
    assert_eq!(
        t.bucket_size(10),
        Err(IndexOutOfRange {
            index: 10,
            capacity: 10
        })
    );
    assert!(t.bucket_iter(10).is_err());
    assert!(t.bucket_iter(0).expect("in range").next().is_none());
}

#[test]
fn error_display() {
    assert_eq!(KeyNotFound.to_string(), "key not found");
    assert_eq!(
        IndexOutOfRange {
            index: 7,
            capacity: 4
        }
        .to_string(),
        "bucket index 7 out of range for capacity 4"
    );
}

// Test: removal semantics.
// Verifies: removing a present key returns its value and decrements len
// by exactly one; removing an absent key returns None and changes nothing.
#[test]
fn remove_present_and_absent() {
    let mut t = ChainTable::new();
    t.set("k".to_string(), 7);
    t.set("other".to_string(), 8);

    assert_eq!(t.remove("k"), Some(7));
    assert!(!t.contains_key("k"));
    assert_eq!(t.len(), 1);

    assert_eq!(t.remove("k"), None);
    assert_eq!(t.len(), 1);
    assert_eq!(t.get("other"), Ok(&8));
}

// Test: unlinking at head, middle, and tail of one chain.
// Assumes: head insertion, so inserting a,b,c yields chain c,b,a.
#[test]
fn remove_at_every_chain_position() {
    let mut t: ChainTable<String, i32, ConstBuildHasher> =
        ChainTable::with_hasher(ConstBuildHasher);
    t.set("a".to_string(), 1);
    t.set("b".to_string(), 2);
    t.set("c".to_string(), 3);
    assert_eq!(chain_keys(&t, 0), ["c", "b", "a"]);

    assert_eq!(t.remove("b"), Some(2)); // middle
    assert_eq!(chain_keys(&t, 0), ["c", "a"]);

    assert_eq!(t.remove("c"), Some(3)); // head
    assert_eq!(chain_keys(&t, 0), ["a"]);

    assert_eq!(t.remove("a"), Some(1)); // tail, bucket becomes empty
    assert!(chain_keys(&t, 0).is_empty());
    assert_eq!(t.bucket_size(0), Ok(0));
    assert!(t.is_empty());
}

// Test: the capacity-2 growth scenario.
// Inserting "a".."d" into a table built with capacity 2 must double at
// least once (whichever trigger fires first depends on the hasher), and
// every value must survive.
#[test]
fn grows_from_capacity_two() {
    let mut t = ChainTable::with_capacity(2);
    for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
        t.set(k.to_string(), i as i32);
    }

    let cap = t.bucket_count();
    assert!(cap >= 4, "expected at least one doubling, got {cap}");
    assert!(
        cap % 2 == 0 && (cap / 2).is_power_of_two(),
        "capacity {cap} must come from doubling 2"
    );
    for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
        assert_eq!(t.get(*k), Ok(&(i as i32)));
    }
    assert_eq!(t.len(), 4);
}

// Test: collision-depth trigger, scripted with a constant hasher.
// The 4th distinct key pushes the shared chain past MAX_COLLISIONS, so
// capacity doubles inside that same set call; the 5th doubles it again.
#[test]
fn collision_trigger_doubles_synchronously() {
    let mut t: ChainTable<String, i32, ConstBuildHasher> =
        ChainTable::with_hasher(ConstBuildHasher);
    for (i, k) in ["a", "b", "c"].iter().enumerate() {
        t.set(k.to_string(), i as i32);
    }
    assert_eq!(t.bucket_count(), DEFAULT_CAPACITY);
    assert_eq!(t.bucket_size(0), Ok(MAX_COLLISIONS));

    t.set("d".to_string(), 3);
    assert_eq!(t.bucket_count(), DEFAULT_CAPACITY * 2);

    t.set("e".to_string(), 4);
    assert_eq!(t.bucket_count(), DEFAULT_CAPACITY * 4);
    for (i, k) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        assert_eq!(t.get(*k), Ok(&(i as i32)));
    }
}

// Test: fill-factor trigger, scripted with an identity hasher.
// Eight singleton buckets out of ten is exactly 0.8 and must not trigger;
// the ninth crosses the threshold and doubles capacity in the same call.
#[test]
fn fill_trigger_fires_strictly_above_threshold() {
    let mut t: ChainTable<u64, u64, IdentityBuildHasher> =
        ChainTable::with_hasher(IdentityBuildHasher);
    for k in 0..8u64 {
        t.set(k, k * 10);
    }
    assert_eq!(t.bucket_count(), 10, "fill factor 0.8 is not above 0.8");

    t.set(8, 80);
    assert_eq!(t.bucket_count(), 20);
    for k in 0..=8u64 {
        assert_eq!(t.get(&k), Ok(&(k * 10)));
        assert_eq!(t.bucket_size(k as usize), Ok(1));
    }
}

// Test: chain order before and after a rehash.
// Head insertion yields newest-first traversal; a rehash walks the old
// chain head to tail and relinks each entry at the new head, so one
// growth reverses a chain that survives intact.
#[test]
fn rehash_reverses_surviving_chain() {
    let mut t: ChainTable<String, i32, ConstBuildHasher> =
        ChainTable::with_hasher(ConstBuildHasher);
    t.set("a".to_string(), 1);
    t.set("b".to_string(), 2);
    t.set("c".to_string(), 3);
    assert_eq!(chain_keys(&t, 0), ["c", "b", "a"]);

    // Overwriting keeps chain position.
    t.set("b".to_string(), 20);
    assert_eq!(chain_keys(&t, 0), ["c", "b", "a"]);
    assert_eq!(t.get("b"), Ok(&20));

    // 4th insert: chain becomes d,c,b,a, then the rehash reverses it.
    t.set("d".to_string(), 4);
    assert_eq!(t.bucket_count(), DEFAULT_CAPACITY * 2);
    assert_eq!(chain_keys(&t, 0), ["a", "b", "c", "d"]);
}

// Test: entry conservation across repeated growth.
// Starting from capacity 2 and inserting well past several rehashes, the
// observable contents must match a table that never grew.
#[test]
fn conservation_across_growth() {
    let mut t = ChainTable::with_capacity(2);
    for i in 0..200u64 {
        t.set(i, i.wrapping_mul(31));
    }
    assert_eq!(t.len(), 200);
    assert!(t.bucket_count() > 2);

    for i in 0..200u64 {
        assert_eq!(t.get(&i), Ok(&i.wrapping_mul(31)));
    }
    let total: usize = (0..t.bucket_count())
        .map(|i| t.bucket_size(i).unwrap())
        .sum();
    assert_eq!(total, 200);
    assert_eq!(t.iter().count(), 200);
}

// Test: capacity is monotone across a mixed workload, including removals
// that empty buckets (removal never shrinks or rehashes).
#[test]
fn capacity_monotone_under_churn() {
    let mut t = ChainTable::with_capacity(2);
    let mut last_cap = t.bucket_count();
    for i in 0..100u64 {
        t.set(i, i);
        assert!(t.bucket_count() >= last_cap);
        last_cap = t.bucket_count();
    }
    for i in 0..100u64 {
        t.remove(&i);
        assert_eq!(t.bucket_count(), last_cap, "remove must never resize");
    }
    assert!(t.is_empty());
}

// Test: borrowed-key lookups via Borrow<str>.
#[test]
fn borrowed_key_lookup() {
    let mut t: ChainTable<String, i32> = ChainTable::new();
    t.set("owned".to_string(), 5);
    assert_eq!(t.get("owned"), Ok(&5));
    assert!(t.contains_key("owned"));
    assert_eq!(t.remove("owned"), Some(5));
}

// Test: the table is move-only; ownership transfers intact.
// (There is no Clone impl to misuse; this just pins down that a moved
// table keeps its contents and capacity.)
#[test]
fn move_transfers_ownership() {
    let mut t = ChainTable::with_capacity(4);
    t.set("x".to_string(), 1);
    let cap = t.bucket_count();

    let moved = t;
    assert_eq!(moved.get("x"), Ok(&1));
    assert_eq!(moved.bucket_count(), cap);

    fn pass_through(t: ChainTable<String, i32>) -> ChainTable<String, i32> {
        t
    }
    let back = pass_through(moved);
    assert_eq!(back.get("x"), Ok(&1));
}
