//! chain-hashmap: a single-threaded hash table using separate chaining,
//! with growth triggered per write by collision depth or bucket fill.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a self-contained table that owns its hashing-to-bucket mapping,
//!   its collision chains, and an online rehash that relocates entries by
//!   relinking rather than copying.
//! - Layers:
//!   - ChainTable<K, V, S>: the core. Buckets are `{head, len}` structs
//!     over a slotmap entry arena; chains are index links between slots.
//!   - word_index: a sample client that tokenizes text and maintains a
//!     bag-of-words index, touching only the table's public operations.
//!
//! Growth policy
//! - Insertion links the new entry at the chain head (O(1)). If the
//!   written bucket's chain then exceeds 3 entries, or more than 80% of
//!   buckets are non-empty, the bucket count doubles and every entry is
//!   relinked before `set` returns. Removal never shrinks capacity.
//!
//! Constraints
//! - Single-threaded: no locking, no atomics. Mutation requires
//!   `&mut self`; cross-thread use needs external exclusion around the
//!   whole table.
//! - Move-only: `ChainTable` does not implement `Clone`. Ownership moves
//!   between bindings; there is no shallow duplicate to misuse.
//! - Iterators borrow the table, so "no mutation while iterating" is a
//!   compile-time guarantee rather than a documented hazard.
//! - Each entry stores its `u64` hash at insert; scans compare the stored
//!   hash before keys and rehashing re-buckets from stored hashes, so
//!   `K: Hash` never runs after insertion.
//!
//! Hasher and rehashing invariants
//! - Generic over `S: BuildHasher` with `RandomState` as the default.
//!   Rehash drains old buckets in ascending index order, chains head to
//!   tail, relinking each entry at its new chain's head; entry slots and
//!   payloads never move.
//!
//! Errors
//! - `get`/`get_mut` report a miss as `KeyNotFound` rather than minting a
//!   default value; bucket accessors report `IndexOutOfRange` for indices
//!   at or past the capacity. Both are plain `Error` types local to the
//!   failing call; no operation leaves the table inconsistent.
//!
//! Notes and non-goals
//! - No capacity shrinking, no custom allocators, no internal
//!   synchronization, no runtime protection for concurrent iteration.
//! - A debug-only reentrancy check guards entry points that run user
//!   `Hash`/`Eq` code; it compiles out in release builds.

mod chain_table;
mod chain_table_proptest;
mod reentrancy;
pub mod word_index;

// Public surface
pub use chain_table::{
    BucketIter, ChainTable, IndexOutOfRange, Iter, KeyNotFound, DEFAULT_CAPACITY, MAX_COLLISIONS,
    MAX_FILL_FACTOR,
};
