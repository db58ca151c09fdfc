//! RunHashMap: table controller tying the bucket directory to the record store.

use crate::bucket_directory::BucketDirectory;
use crate::cursor::{Cursor, CursorMut, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::record_store::{Pos, RecordStore};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::Equivalent;
use std::collections::hash_map::RandomState;

/// Grow-trigger numerator; also the bucket multiplier applied by `resize`.
pub(crate) const LOAD_K: usize = 19;
/// Grow-trigger denominator and shrink-trigger numerator.
pub(crate) const LOAD_DELTA: usize = 17;

/// Returned by [`RunHashMap::at`] when the key is absent.
#[derive(thiserror::Error, Copy, Clone, Debug, Eq, PartialEq)]
#[error("key not found")]
pub struct KeyNotFound;

/// Hash map whose buckets are contiguous runs inside one shared record
/// sequence. Iteration walks that sequence, independent of buckets.
pub struct RunHashMap<K, V, S = RandomState> {
    hasher: S,
    records: RecordStore<K, V>,
    directory: BucketDirectory,
}

impl<K, V> RunHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Empty map with the directory pre-sized for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S> Default for RunHashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self {
            hasher: S::default(),
            records: RecordStore::new(),
            directory: BucketDirectory::new(),
        }
    }
}

// Structural operations. These only use cached hashes, so they need no
// bounds on `K` and never call back into user code.
impl<K, V, S> RunHashMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.len() == 0
    }

    /// The hash builder (`hash_function`).
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Number of slots in the bucket directory.
    pub fn bucket_count(&self) -> usize {
        self.directory.capacity()
    }

    /// Drop every entry; the hasher is kept.
    pub fn clear(&mut self) {
        self.records.clear();
        self.directory.clear();
    }

    #[inline]
    fn needs_grow(&self) -> bool {
        (self.len() + 1) * LOAD_K > LOAD_DELTA * self.directory.capacity()
    }

    #[inline]
    fn needs_shrink(&self) -> bool {
        self.len() * LOAD_K * LOAD_DELTA < self.directory.capacity()
    }

    /// Rehash into `hint * LOAD_K` fresh buckets. Records are re-linked in
    /// former sequence order, each in front of its new bucket's head, so
    /// the resulting sequence is grouped by bucket.
    fn resize(&mut self, hint: usize) {
        let capacity = hint * LOAD_K;
        trace_resize(self.directory.capacity(), capacity, self.len());
        let order = self.records.take_sequence();
        self.directory.rebuild(capacity);
        debug_assert!(capacity > 0 || order.is_empty());
        for pos in order {
            let Some(hash) = self.records.get(pos).map(|r| r.hash) else {
                continue;
            };
            let slot = self.directory.slot_of(hash);
            let bucket = self.directory.bucket_mut(slot);
            self.records.link_before(pos, bucket.head);
            bucket.head = Some(pos);
            bucket.count += 1;
        }
    }

    /// Create a record at the head of `slot`'s run.
    fn link_new(&mut self, slot: usize, key: K, value: V, hash: u64) -> Pos {
        let bucket = self.directory.bucket_mut(slot);
        let pos = self.records.insert_before(bucket.head, key, value, hash);
        bucket.head = Some(pos);
        bucket.count += 1;
        pos
    }

    /// Bounded scan of `slot`'s run: exactly `count` steps from its head.
    fn scan_run<Q>(&self, slot: usize, hash: u64, q: &Q) -> Option<Pos>
    where
        Q: ?Sized + Equivalent<K>,
    {
        let bucket = self.directory.bucket(slot);
        let mut cur = bucket.head;
        for _ in 0..bucket.count {
            let pos = cur?;
            let record = self.records.get(pos)?;
            if record.hash == hash && q.equivalent(&record.key) {
                return Some(pos);
            }
            cur = record.next();
        }
        None
    }

    /// Append copies of `source`'s records. Source keys are unique, so no
    /// duplicate scan is done.
    fn copy_records_from(&mut self, source: &Self)
    where
        K: Clone,
        V: Clone,
    {
        if source.len() * LOAD_K > self.directory.capacity() * LOAD_DELTA {
            self.resize(source.len());
        }
        for (_, record) in source.records.sequence() {
            let slot = self.directory.slot_of(record.hash);
            self.link_new(
                slot,
                record.key.clone(),
                record.value.clone(),
                record.hash,
            );
        }
    }

    /// Cursor at the first entry of the sequence (`begin`).
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        Cursor::new(&self.records, self.records.first())
    }

    /// The one-past-last cursor (`end`).
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor::new(&self.records, None)
    }

    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V> {
        let first = self.records.first();
        CursorMut::new(&mut self.records, first)
    }

    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::new(&mut self.records, None)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.records)
    }

    /// Mutable iteration in sequence order.
    ///
    /// Builds a position map sized to the largest number of records the map
    /// has ever held at once, not to `len()`.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.records)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Same allocation cost as [`iter_mut`](Self::iter_mut).
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.iter_mut())
    }
}

impl<K, V, S> RunHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            records: RecordStore::new(),
            directory: BucketDirectory::new(),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let mut map = Self {
            hasher,
            records: RecordStore::with_capacity(capacity),
            directory: BucketDirectory::new(),
        };
        if capacity > 0 {
            map.resize(capacity);
        }
        map
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn find_pos<Q>(&self, q: &Q) -> Option<Pos>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        // An empty table may have no buckets at all.
        if self.is_empty() {
            return None;
        }
        let hash = self.make_hash(q);
        self.scan_run(self.directory.slot_of(hash), hash, q)
    }

    /// Insert `key -> value` unless `key` is already present, in which case
    /// the pair is dropped and the stored value is left untouched. Returns
    /// whether a new entry was created.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.needs_grow() {
            self.resize(self.len() + 1);
        }
        self.insert_without_resize(key, value)
    }

    fn insert_without_resize(&mut self, key: K, value: V) -> bool {
        let hash = self.make_hash(&key);
        let slot = self.directory.slot_of(hash);
        if self.scan_run(slot, hash, &key).is_some() {
            return false;
        }
        self.link_new(slot, key, value, hash);
        true
    }

    /// Size the directory for `pairs`, insert them with duplicate checks,
    /// then shrink if duplicates left it oversized.
    fn insert_bulk(&mut self, pairs: Vec<(K, V)>) {
        if !pairs.is_empty() {
            self.resize(pairs.len());
        }
        for (key, value) in pairs {
            self.insert_without_resize(key, value);
        }
        if self.needs_shrink() {
            self.resize(self.len());
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Remove the entry for `q` (`erase`), returning the owned pair.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if self.is_empty() {
            return None;
        }
        let hash = self.make_hash(q);
        let slot = self.directory.slot_of(hash);
        let pos = self.scan_run(slot, hash, q)?;

        let next = self.records.next(pos);
        let bucket = self.directory.bucket_mut(slot);
        if bucket.head == Some(pos) {
            bucket.head = if bucket.count > 1 { next } else { None };
        }
        bucket.count -= 1;
        let removed = self.records.remove(pos);
        debug_assert!(removed.is_some());

        if self.needs_shrink() {
            self.resize(self.len());
        }
        removed
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.find_pos(q).is_some()
    }

    /// Cursor at the entry for `q`, or the end cursor if absent.
    pub fn find<Q>(&self, q: &Q) -> Cursor<'_, K, V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        Cursor::new(&self.records, self.find_pos(q))
    }

    pub fn find_mut<Q>(&mut self, q: &Q) -> CursorMut<'_, K, V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let pos = self.find_pos(q);
        CursorMut::new(&mut self.records, pos)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let pos = self.find_pos(q)?;
        self.records.get(pos).map(|r| &r.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let pos = self.find_pos(q)?;
        self.records.get(pos).map(|r| (&r.key, &r.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let pos = self.find_pos(q)?;
        self.records.get_mut(pos).map(|r| &mut r.value)
    }

    /// Read-only keyed access; fails instead of inserting.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.get(q).ok_or(KeyNotFound)
    }

    /// Value for `key`, inserting `V::default()` first if absent
    /// (`table[key]`).
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Value for `key`, inserting `default()` first if absent. `default`
    /// only runs when an entry is created.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        if !self.is_empty() {
            if let Some(pos) = self.scan_run(self.directory.slot_of(hash), hash, &key) {
                return self.records.value_mut(pos);
            }
        }
        if self.needs_grow() {
            self.resize(self.len() + 1);
        }
        let slot = self.directory.slot_of(hash);
        let pos = self.link_new(slot, key, default(), hash);
        self.records.value_mut(pos)
    }
}

impl<K, V, S> Clone for RunHashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        let mut out = Self {
            hasher: self.hasher.clone(),
            records: RecordStore::with_capacity(self.len()),
            directory: BucketDirectory::new(),
        };
        out.copy_records_from(self);
        out
    }

    /// Old contents are dropped before copying; no record is shared.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.hasher = source.hasher.clone();
        self.copy_records_from(source);
    }
}

impl<K, V, S> FromIterator<(K, V)> for RunHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.insert_bulk(iter.into_iter().collect());
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RunHashMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

impl<K, V, S> Extend<(K, V)> for RunHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, Q, V, S> Index<&Q> for RunHashMap<K, V, S>
where
    K: Eq + Hash,
    Q: ?Sized + Hash + Equivalent<K>,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is absent; use [`RunHashMap::at`] to get an error.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in RunHashMap")
    }
}

impl<K, V, S> PartialEq for RunHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| v == ov))
    }
}

impl<K, V, S> Eq for RunHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for RunHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> IntoIterator for RunHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter::new(self.records)
    }
}

impl<'a, K, V, S> IntoIterator for &'a RunHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut RunHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[inline]
fn trace_resize(from: usize, to: usize, len: usize) {
    #[cfg(feature = "logging")]
    log::trace!("resizing bucket directory from {from} to {to} buckets ({len} records)");
    #[cfg(not(feature = "logging"))]
    let _ = (from, to, len);
}

#[cfg(test)]
impl<K, V, S> RunHashMap<K, V, S> {
    /// Rebuild bucket membership from cached hashes and compare it with the
    /// directory.
    pub(crate) fn assert_invariants(&self) {
        use std::collections::HashMap;

        let capacity = self.directory.capacity();
        assert_eq!(self.records.sequence().count(), self.len());
        let total: usize = self.directory.iter().map(|b| b.count).sum();
        assert_eq!(total, self.len(), "bucket counts must sum to len");
        if capacity == 0 {
            assert!(self.is_empty(), "entries without buckets");
            return;
        }

        let mut owner: HashMap<Pos, usize> = HashMap::new();
        for (slot, bucket) in self.directory.iter().enumerate() {
            assert_eq!(bucket.head.is_none(), bucket.count == 0);
            let mut cur = bucket.head;
            for _ in 0..bucket.count {
                let pos = cur.expect("run shorter than its count");
                let record = self.records.get(pos).expect("run points at a freed record");
                assert_eq!(self.directory.slot_of(record.hash), slot);
                assert!(owner.insert(pos, slot).is_none(), "record in two runs");
                cur = record.next();
            }
        }
        assert_eq!(owner.len(), self.len(), "record outside every run");
        assert!(self.len() * LOAD_K <= LOAD_DELTA * capacity);
    }
}
