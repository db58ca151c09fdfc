//! RecordStore: arena of records threaded into one doubly-linked sequence.

use slotmap::{DefaultKey, SlotMap};

/// Stable position of a record inside the store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Pos(DefaultKey);

#[derive(Debug)]
pub(crate) struct Record<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    prev: Option<Pos>,
    next: Option<Pos>,
}

impl<K, V> Record<K, V> {
    #[inline]
    pub(crate) fn next(&self) -> Option<Pos> {
        self.next
    }
}

#[derive(Debug)]
pub(crate) struct RecordStore<K, V> {
    slots: SlotMap<DefaultKey, Record<K, V>>, // freed slots are reused
    head: Option<Pos>,
    tail: Option<Pos>,
}

impl<K, V> RecordStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn first(&self) -> Option<Pos> {
        self.head
    }

    #[inline]
    pub(crate) fn next(&self, pos: Pos) -> Option<Pos> {
        self.slots.get(pos.0).and_then(|r| r.next)
    }

    #[inline]
    pub(crate) fn get(&self, pos: Pos) -> Option<&Record<K, V>> {
        self.slots.get(pos.0)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, pos: Pos) -> Option<&mut Record<K, V>> {
        self.slots.get_mut(pos.0)
    }

    /// Value of a live record. Panics on a stale position.
    #[inline]
    pub(crate) fn value_mut(&mut self, pos: Pos) -> &mut V {
        &mut self.slots[pos.0].value
    }

    /// Walk the sequence from its first record.
    pub(crate) fn sequence(&self) -> Sequence<'_, K, V> {
        Sequence {
            store: self,
            cur: self.head,
        }
    }

    /// Allocate a record and link it immediately before `at`, or at the tail
    /// when `at` is `None`.
    pub(crate) fn insert_before(&mut self, at: Option<Pos>, key: K, value: V, hash: u64) -> Pos {
        let pos = Pos(self.slots.insert(Record {
            key,
            value,
            hash,
            prev: None,
            next: None,
        }));
        self.link_before(pos, at);
        pos
    }

    /// Link a detached record before `at` (tail when `None`).
    pub(crate) fn link_before(&mut self, pos: Pos, at: Option<Pos>) {
        let prev = match at {
            Some(at) => self.slots.get(at.0).and_then(|r| r.prev),
            None => self.tail,
        };
        if let Some(r) = self.slots.get_mut(pos.0) {
            r.prev = prev;
            r.next = at;
        }
        match prev {
            Some(p) => {
                if let Some(r) = self.slots.get_mut(p.0) {
                    r.next = Some(pos);
                }
            }
            None => self.head = Some(pos),
        }
        match at {
            Some(n) => {
                if let Some(r) = self.slots.get_mut(n.0) {
                    r.prev = Some(pos);
                }
            }
            None => self.tail = Some(pos),
        }
    }

    /// Unlink and free the record at `pos`, handing back its contents.
    pub(crate) fn remove(&mut self, pos: Pos) -> Option<(K, V)> {
        let record = self.slots.remove(pos.0)?;
        match record.prev {
            Some(p) => {
                if let Some(r) = self.slots.get_mut(p.0) {
                    r.next = record.next;
                }
            }
            None => self.head = record.next,
        }
        match record.next {
            Some(n) => {
                if let Some(r) = self.slots.get_mut(n.0) {
                    r.prev = record.prev;
                }
            }
            None => self.tail = record.prev,
        }
        Some((record.key, record.value))
    }

    /// Detach every record from the sequence, keeping them allocated.
    /// Returns their positions in former sequence order.
    pub(crate) fn take_sequence(&mut self) -> Vec<Pos> {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut cur = self.head.take();
        self.tail = None;
        while let Some(pos) = cur {
            let Some(r) = self.slots.get_mut(pos.0) else {
                break;
            };
            cur = r.next.take();
            r.prev = None;
            order.push(pos);
        }
        debug_assert_eq!(order.len(), self.slots.len());
        order
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// Mutable references to every record, keyed by position.
    pub(crate) fn records_mut(&mut self) -> slotmap::SecondaryMap<DefaultKey, &mut Record<K, V>> {
        self.slots.iter_mut().collect()
    }

    /// Split off all records for owned iteration.
    pub(crate) fn into_parts(self) -> (SlotMap<DefaultKey, Record<K, V>>, Option<Pos>) {
        (self.slots, self.head)
    }
}

/// Borrowing walk over the sequence, yielding each record with its position.
pub(crate) struct Sequence<'a, K, V> {
    store: &'a RecordStore<K, V>,
    cur: Option<Pos>,
}

impl<'a, K, V> Clone for Sequence<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            cur: self.cur,
        }
    }
}

impl<'a, K, V> Iterator for Sequence<'a, K, V> {
    type Item = (Pos, &'a Record<K, V>);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.cur?;
        let record = self.store.slots.get(pos.0)?;
        self.cur = record.next;
        Some((pos, record))
    }
}

impl Pos {
    #[inline]
    pub(crate) fn raw(self) -> DefaultKey {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(store: &RecordStore<&'static str, i32>) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut cur = store.first();
        while let Some(pos) = cur {
            out.push(store.get(pos).unwrap().key);
            cur = store.next(pos);
        }
        // The borrowing walk must agree with manual stepping.
        let walked: Vec<_> = store.sequence().map(|(_, r)| r.key).collect();
        assert_eq!(out, walked);
        out
    }

    /// Invariant: `insert_before(None, ..)` appends; `insert_before(Some(p), ..)`
    /// places the new record directly in front of `p`.
    #[test]
    fn insert_before_positions() {
        let mut s = RecordStore::new();
        let a = s.insert_before(None, "a", 1, 0);
        let _c = s.insert_before(None, "c", 3, 0);
        let _b0 = s.insert_before(Some(a), "b0", 0, 0);
        assert_eq!(keys(&s), ["b0", "a", "c"]);
        assert_eq!(s.len(), 3);
    }

    /// Invariant: removal at head, middle and tail keeps both link directions
    /// consistent and returns the owned pair.
    #[test]
    fn remove_relinks_neighbours() {
        let mut s = RecordStore::new();
        let a = s.insert_before(None, "a", 1, 0);
        let b = s.insert_before(None, "b", 2, 0);
        let c = s.insert_before(None, "c", 3, 0);

        assert_eq!(s.remove(b), Some(("b", 2)));
        assert_eq!(keys(&s), ["a", "c"]);
        assert_eq!(s.remove(a), Some(("a", 1)));
        assert_eq!(keys(&s), ["c"]);
        assert_eq!(s.remove(c), Some(("c", 3)));
        assert!(keys(&s).is_empty());
        assert!(s.first().is_none());
        assert!(s.remove(c).is_none(), "stale position must not resolve");

        // Tail was reset: appending works from scratch.
        s.insert_before(None, "d", 4, 0);
        assert_eq!(keys(&s), ["d"]);
    }

    /// Invariant: `take_sequence` reports former order and leaves every record
    /// detached but alive, ready to be re-linked.
    #[test]
    fn take_sequence_then_relink_reversed() {
        let mut s = RecordStore::new();
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            s.insert_before(None, k, v, 0);
        }
        let order = s.take_sequence();
        assert_eq!(order.len(), 3);
        assert!(s.first().is_none());
        assert_eq!(s.len(), 3);

        let mut head = None;
        for pos in order {
            s.link_before(pos, head);
            head = Some(pos);
        }
        assert_eq!(keys(&s), ["c", "b", "a"]);
    }
}
