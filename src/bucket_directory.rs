//! BucketDirectory: per-slot `{ head, count }` descriptors over the record sequence.
//!
//! A bucket owns no storage. Its entries are the `count` records that start at
//! `head` in the shared sequence; a scan must stop after `count` steps because
//! the next record may already belong to another bucket.

use crate::record_store::Pos;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Bucket {
    pub(crate) head: Option<Pos>,
    pub(crate) count: usize,
}

#[derive(Debug, Default)]
pub(crate) struct BucketDirectory {
    buckets: Vec<Bucket>,
}

impl BucketDirectory {
    pub(crate) fn new() -> Self {
        Self {
            buckets: Vec::new(),
        }
    }

    /// Number of slots.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Replace every descriptor with `capacity` empty ones.
    pub(crate) fn rebuild(&mut self, capacity: usize) {
        self.buckets.clear();
        self.buckets.resize(capacity, Bucket::default());
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Slot for a hash. Callers must not ask on an empty directory.
    #[inline]
    pub(crate) fn slot_of(&self, hash: u64) -> usize {
        debug_assert!(!self.buckets.is_empty(), "slot_of on empty directory");
        (hash % self.buckets.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn bucket(&self, slot: usize) -> Bucket {
        self.buckets[slot]
    }

    #[inline]
    pub(crate) fn bucket_mut(&mut self, slot: usize) -> &mut Bucket {
        &mut self.buckets[slot]
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Bucket> + '_ {
        self.buckets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_resets_all_descriptors() {
        let mut d = BucketDirectory::new();
        assert_eq!(d.capacity(), 0);
        d.rebuild(19);
        assert_eq!(d.capacity(), 19);
        d.bucket_mut(3).count = 2;
        d.rebuild(38);
        assert_eq!(d.capacity(), 38);
        assert!(d.iter().all(|b| b.head.is_none() && b.count == 0));
    }

    #[test]
    fn slot_of_is_hash_mod_capacity() {
        let mut d = BucketDirectory::new();
        d.rebuild(19);
        assert_eq!(d.slot_of(0), 0);
        assert_eq!(d.slot_of(20), 1);
        assert_eq!(d.slot_of(u64::MAX), (u64::MAX % 19) as usize);
    }
}
