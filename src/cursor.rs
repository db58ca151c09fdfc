//! Cursors and iterators over the record sequence.
//!
//! All of them walk the single global sequence and ignore bucket
//! boundaries. Iterators are bounded by the entry count, so they are exact
//! sized and never run past the last record.

use crate::record_store::{Pos, Record, RecordStore, Sequence};
use core::fmt;
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Read-only position in the sequence. The end cursor sits one past the
/// last entry and dereferences to `None`.
pub struct Cursor<'a, K, V> {
    store: &'a RecordStore<K, V>,
    pos: Option<Pos>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn new(store: &'a RecordStore<K, V>, pos: Option<Pos>) -> Self {
        Self { store, pos }
    }

    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, v)| v)
    }

    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        let record = self.store.get(self.pos?)?;
        Some((&record.key, &record.value))
    }

    /// Step to the next entry. Stepping the end cursor is a no-op.
    pub fn move_next(&mut self) {
        if let Some(pos) = self.pos {
            self.pos = self.store.next(pos);
        }
    }

    /// Step forward and return the cursor as it was before the step.
    pub fn advance(&mut self) -> Self {
        let before = *self;
        self.move_next();
        before
    }
}

impl<'a, K, V> Clone for Cursor<'a, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V> Copy for Cursor<'a, K, V> {}

impl<'a, K, V> PartialEq for Cursor<'a, K, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.store, other.store) && self.pos == other.pos
    }
}

impl<'a, K, V> Eq for Cursor<'a, K, V> {}

impl<'a, K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

/// Position in the sequence with mutable access to values.
pub struct CursorMut<'a, K, V> {
    store: &'a mut RecordStore<K, V>,
    pos: Option<Pos>,
}

impl<'a, K, V> CursorMut<'a, K, V> {
    pub(crate) fn new(store: &'a mut RecordStore<K, V>, pos: Option<Pos>) -> Self {
        Self { store, pos }
    }

    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    pub fn key(&self) -> Option<&K> {
        self.store.get(self.pos?).map(|r| &r.key)
    }

    pub fn value(&self) -> Option<&V> {
        self.store.get(self.pos?).map(|r| &r.value)
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.store.get_mut(self.pos?).map(|r| &mut r.value)
    }

    pub fn key_value_mut(&mut self) -> Option<(&K, &mut V)> {
        let record = self.store.get_mut(self.pos?)?;
        Some((&record.key, &mut record.value))
    }

    /// Consume the cursor, keeping the value borrow for the full lifetime.
    pub fn into_value_mut(self) -> Option<&'a mut V> {
        let pos = self.pos?;
        self.store.get_mut(pos).map(|r| &mut r.value)
    }

    pub fn move_next(&mut self) {
        if let Some(pos) = self.pos {
            self.pos = self.store.next(pos);
        }
    }

    /// Read-only view at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.store, self.pos)
    }
}

impl<'a, K: fmt::Debug, V: fmt::Debug> fmt::Debug for CursorMut<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut")
            .field(&self.as_cursor().key_value())
            .finish()
    }
}

/// Iterator over `(&K, &V)` in sequence order.
pub struct Iter<'a, K, V> {
    seq: Sequence<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(store: &'a RecordStore<K, V>) -> Self {
        Self {
            seq: store.sequence(),
            remaining: store.len(),
        }
    }
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (_, record) = self.seq.next()?;
        self.remaining -= 1;
        Some((&record.key, &record.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in sequence order.
pub struct IterMut<'a, K, V> {
    // Each record is handed out once: removed from here as it is yielded.
    records: SecondaryMap<DefaultKey, &'a mut Record<K, V>>,
    cur: Option<Pos>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(store: &'a mut RecordStore<K, V>) -> Self {
        let cur = store.first();
        let remaining = store.len();
        Self {
            records: store.records_mut(),
            cur,
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let record = self.records.remove(self.cur?.raw())?;
        self.cur = record.next();
        self.remaining -= 1;
        Some((&record.key, &mut record.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in sequence order.
pub struct IntoIter<K, V> {
    slots: SlotMap<DefaultKey, Record<K, V>>,
    cur: Option<Pos>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(store: RecordStore<K, V>) -> Self {
        let (slots, cur) = store.into_parts();
        Self { slots, cur }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<(K, V)> {
        let record = self.slots.remove(self.cur?.raw())?;
        self.cur = record.next();
        Some((record.key, record.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.slots.len(), Some(self.slots.len()))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> ValuesMut<'a, K, V> {
    pub(crate) fn new(inner: IterMut<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}
