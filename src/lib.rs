//! run-hashmap: a single-threaded hash map whose buckets are contiguous
//! runs inside one shared, doubly-linked record sequence.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: separate chaining without per-bucket lists. Every entry lives in
//!   one global sequence; a bucket is just `{ head, count }` naming the run
//!   of sequence positions that hash to it. Whole-table iteration is a plain
//!   walk of the sequence and never visits empty buckets.
//! - Layers:
//!   - RecordStore<K, V>: arena of records (`slotmap`, freed slots are
//!     reused) with explicit `prev`/`next` links. Sole owner of entries.
//!   - BucketDirectory: `Vec` of `{ head, count }` descriptors, replaced
//!     wholesale on every resize.
//!   - RunHashMap<K, V, S>: hashing, run scans, grow/shrink policy and the
//!     public API.
//!   - cursor: `Cursor`/`CursorMut` positions and the iterator types.
//!
//! Run discipline
//! - New keys are linked in front of their bucket's head; a bucket with no
//!   entries starts a new run at the tail of the sequence. Both keep runs
//!   contiguous.
//! - Scans stop after `count` steps, never at the end of the sequence: the
//!   record after a run usually belongs to another bucket.
//! - Removing a run's head moves the head to the next record when the run
//!   has more entries, otherwise clears it.
//!
//! Growth policy
//! - With `K = 19` and `DELTA = 17`: before an insert, if
//!   `(len + 1) * K > DELTA * buckets` the directory is rebuilt with
//!   `(len + 1) * K` buckets. After a removal, if `len * K * DELTA < buckets`
//!   it is rebuilt with `len * K` buckets (zero when the map becomes empty).
//! - A rebuild re-links records in their former sequence order, each in
//!   front of its new bucket's head. Order inside a run is reversed and the
//!   sequence ends up grouped by bucket.
//!
//! Iteration order
//! - Whatever the internal sequence currently is. Inserts without a rebuild
//!   do not move existing entries; a rebuild may reorder everything. No
//!   insertion-order guarantee is made.
//!
//! Hashing
//! - Each record caches its `u64` hash. Rebuilds and clones reuse it, so
//!   `K: Hash` runs once per inserted key and once per lookup.
//! - Lookups accept any `Q: Hash + Equivalent<K>` (`hashbrown`'s trait),
//!   which covers every `Borrow` form such as `&str` for `String` keys.
//!
//! Duplicates
//! - `insert` keeps the first value for a key and drops the new pair.
//!   `get_or_insert_default` / `get_or_insert_with` are the
//!   search-or-create paths.
//!
//! Errors
//! - `at` is the only fallible accessor and reports `KeyNotFound`. Missing
//!   keys elsewhere are `None` or the end cursor.
//!
//! Notes and non-goals
//! - Single-threaded; no interior mutability. Cursors and iterators borrow
//!   the map, so the borrow checker rules out use after a rebuild.
//! - With the `logging` feature, rebuilds emit `log::trace!` events.
//! - `iter_mut`/`values_mut` hand out disjoint `&mut` through a position map
//!   sized to the record arena's high-water mark, so after growing to N and
//!   erasing down to a few entries each call still allocates for about N
//!   slots.

mod bucket_directory;
pub mod cursor;
mod record_store;
mod run_hash_map;
mod run_hash_map_proptest;

// Public surface
pub use run_hash_map::{KeyNotFound, RunHashMap};
