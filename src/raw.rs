//! RawTable: fixed-capacity Robin Hood slot array with lazy tombstones.
//!
//! This is the structural layer under `HashSet` and both indices of
//! `BidiMap`. It knows nothing about keys: callers hand in a precomputed
//! `u64` hash with every item and an equality closure for lookups. The
//! cached hash is what displacement and rehashing use, so user `Hash`
//! never runs inside this module.
//!
//! Invariants
//! - `filled` counts `Slot::Filled`, `deleted` counts `Slot::Deleted`.
//! - A filled slot at index `i` has `dist == (i - hash % capacity) mod capacity`.
//! - Removal never shifts neighbours; it leaves a tombstone so probe runs
//!   that pass through the slot stay intact until the next rehash.

use crate::error::ResizeError;
use std::collections::TryReserveError;
use core::iter::FusedIterator;
use core::mem;

#[derive(Debug, Clone)]
pub(crate) struct Bucket<T> {
    pub(crate) item: T,
    pub(crate) hash: u64,
    pub(crate) dist: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum Slot<T> {
    Empty,
    Deleted,
    Filled(Bucket<T>),
}

#[derive(Debug, Clone)]
pub(crate) struct RawTable<T> {
    slots: Box<[Slot<T>]>,
    filled: usize,
    deleted: usize,
}

impl<T> RawTable<T> {
    /// Allocate `capacity` empty slots, reporting allocation failure.
    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        debug_assert!(capacity > 0, "tables always have at least one slot");
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize_with(capacity, || Slot::Empty);
        Ok(Self {
            slots: slots.into_boxed_slice(),
            filled: 0,
            deleted: 0,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.filled
    }

    #[inline]
    pub(crate) fn tombstones(&self) -> usize {
        self.deleted
    }

    #[inline]
    fn home(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    #[inline]
    fn step(&self, pos: usize) -> usize {
        if pos + 1 == self.slots.len() {
            0
        } else {
            pos + 1
        }
    }

    /// Slot index of the item with `hash` for which `eq` holds.
    ///
    /// Walks the run of filled and deleted slots starting at the home slot.
    /// Stops at the first empty slot, or after one full lap when tombstones
    /// have eaten every empty slot.
    pub(crate) fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        let mut pos = self.home(hash);
        for _ in 0..self.slots.len() {
            match &self.slots[pos] {
                Slot::Empty => return None,
                Slot::Filled(b) if b.hash == hash && eq(&b.item) => return Some(pos),
                _ => {}
            }
            pos = self.step(pos);
        }
        None
    }

    /// Robin Hood placement. The caller guarantees `item` is not present.
    ///
    /// Returns the slot where `item` itself ended up (residents it displaced
    /// move further along), or gives the item back when no slot is free.
    pub(crate) fn insert(&mut self, hash: u64, item: T) -> Result<usize, T> {
        if self.filled == self.slots.len() {
            return Err(item);
        }
        let mut pos = self.home(hash);
        let mut carry = Bucket { item, hash, dist: 0 };
        let mut landed = None;
        loop {
            match &mut self.slots[pos] {
                Slot::Filled(resident) => {
                    // Steal from the rich: the poorer (further travelled)
                    // bucket keeps the slot.
                    if resident.dist < carry.dist {
                        mem::swap(resident, &mut carry);
                        landed.get_or_insert(pos);
                    }
                }
                vacant => {
                    if matches!(vacant, Slot::Deleted) {
                        self.deleted -= 1;
                    }
                    *vacant = Slot::Filled(carry);
                    self.filled += 1;
                    return Ok(landed.unwrap_or(pos));
                }
            }
            pos = self.step(pos);
            carry.dist += 1;
        }
    }

    /// Turn a filled slot into a tombstone and hand back its item.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Filled(_)) {
            return None;
        }
        match mem::replace(slot, Slot::Deleted) {
            Slot::Filled(b) => {
                self.filled -= 1;
                self.deleted += 1;
                Some(b.item)
            }
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn bucket(&self, index: usize) -> Option<&Bucket<T>> {
        match self.slots.get(index) {
            Some(Slot::Filled(b)) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.bucket(index).map(|b| &b.item)
    }

    #[inline]
    fn is_filled(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Filled(_)))
    }

    pub(crate) fn first_filled(&self) -> Option<usize> {
        (0..self.slots.len()).find(|&i| self.is_filled(i))
    }

    pub(crate) fn last_filled(&self) -> Option<usize> {
        (0..self.slots.len()).rev().find(|&i| self.is_filled(i))
    }

    /// First filled slot strictly after `index`.
    pub(crate) fn next_filled(&self, index: usize) -> Option<usize> {
        (index + 1..self.slots.len()).find(|&i| self.is_filled(i))
    }

    /// Last filled slot strictly before `index`.
    pub(crate) fn prev_filled(&self, index: usize) -> Option<usize> {
        (0..index.min(self.slots.len()))
            .rev()
            .find(|&i| self.is_filled(i))
    }

    pub(crate) fn iter(&self) -> RawIter<'_, T> {
        RawIter {
            slots: self.slots.iter(),
            remaining: self.filled,
        }
    }

    /// `true` when live entries plus tombstones reach the fill threshold
    /// while live entries alone do not: a same-size rehash is due.
    pub(crate) fn crowded(&self, load: f64) -> bool {
        let limit = self.slots.len() as f64 * load;
        (self.filled + self.deleted) as f64 >= limit && (self.filled as f64) < limit
    }

    /// Rebuild into `capacity` slots, dropping every tombstone.
    ///
    /// The new table is allocated before anything moves, so an allocation
    /// failure leaves `self` untouched.
    pub(crate) fn rehash(&mut self, capacity: usize) -> Result<(), ResizeError> {
        if capacity <= self.filled {
            return Err(ResizeError::TooSmall {
                requested: capacity,
                count: self.filled,
            });
        }
        let fresh = RawTable::try_with_capacity(capacity)?;
        self.move_into(fresh);
        Ok(())
    }

    /// Re-place every live item into `fresh` by cached hash and adopt it.
    /// `fresh` must be empty and have more slots than `self` has items.
    pub(crate) fn move_into(&mut self, mut fresh: RawTable<T>) {
        debug_assert!(fresh.filled == 0 && fresh.capacity() > self.filled);
        let expected = self.filled;
        for slot in mem::take(&mut self.slots).into_vec() {
            if let Slot::Filled(b) = slot {
                // Cannot fail: `fresh` has a free slot for every item.
                let _ = fresh.insert(b.hash, b.item);
            }
        }
        debug_assert_eq!(fresh.filled, expected);
        *self = fresh;
    }

    pub(crate) fn clear(&mut self) {
        for s in self.slots.iter_mut() {
            *s = Slot::Empty;
        }
        self.filled = 0;
        self.deleted = 0;
    }

    /// Swap in an empty table of the same capacity and yield every live
    /// item of the old one in slot order.
    pub(crate) fn drain(&mut self) -> RawIntoIter<T> {
        let cap = self.slots.len();
        let mut slots = Vec::with_capacity(cap);
        slots.resize_with(cap, || Slot::Empty);
        let old = mem::replace(
            self,
            RawTable {
                slots: slots.into_boxed_slice(),
                filled: 0,
                deleted: 0,
            },
        );
        old.into_items()
    }

    pub(crate) fn into_items(self) -> RawIntoIter<T> {
        RawIntoIter {
            remaining: self.filled,
            slots: self.slots.into_vec().into_iter(),
        }
    }

    /// Same layout (tombstones included), items mapped through `f`.
    pub(crate) fn map_items<U>(
        &self,
        mut f: impl FnMut(&T) -> U,
    ) -> Result<RawTable<U>, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(self.slots.len())?;
        slots.extend(self.slots.iter().map(|s| match s {
            Slot::Empty => Slot::Empty,
            Slot::Deleted => Slot::Deleted,
            Slot::Filled(b) => Slot::Filled(Bucket {
                item: f(&b.item),
                hash: b.hash,
                dist: b.dist,
            }),
        }));
        Ok(RawTable {
            slots: slots.into_boxed_slice(),
            filled: self.filled,
            deleted: self.deleted,
        })
    }

    /// Panics if a filled slot's `dist` disagrees with its home slot.
    #[cfg(test)]
    pub(crate) fn assert_displacements(&self) {
        let cap = self.slots.len();
        for (i, s) in self.slots.iter().enumerate() {
            if let Slot::Filled(b) = s {
                let home = self.home(b.hash);
                let expect = (i + cap - home) % cap;
                assert_eq!(b.dist, expect, "slot {i}: home {home}");
            }
        }
    }

    /// Panics if two adjacent filled slots break the Robin Hood ordering.
    /// Only meaningful for tables that have never seen a removal.
    #[cfg(test)]
    pub(crate) fn assert_robin_hood(&self) {
        let cap = self.slots.len();
        for i in 0..cap {
            let j = self.step(i);
            if let (Some(a), Some(b)) = (self.bucket(i), self.bucket(j)) {
                assert!(
                    b.dist <= a.dist + 1,
                    "slot {j} travelled {} after slot {i} travelled {}",
                    b.dist,
                    a.dist
                );
            }
        }
    }
}

/// Borrowing walk over live items in slot order.
pub(crate) struct RawIter<'a, T> {
    slots: core::slice::Iter<'a, Slot<T>>,
    remaining: usize,
}

impl<T> Clone for RawIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for RawIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        for s in self.slots.by_ref() {
            if let Slot::Filled(b) = s {
                self.remaining -= 1;
                return Some(&b.item);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for RawIter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        while let Some(s) = self.slots.next_back() {
            if let Slot::Filled(b) = s {
                self.remaining -= 1;
                return Some(&b.item);
            }
        }
        None
    }
}

impl<T> ExactSizeIterator for RawIter<'_, T> {}
impl<T> FusedIterator for RawIter<'_, T> {}

/// Owning walk over live items in slot order.
pub(crate) struct RawIntoIter<T> {
    slots: std::vec::IntoIter<Slot<T>>,
    remaining: usize,
}

impl<T> Iterator for RawIntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        for s in self.slots.by_ref() {
            if let Slot::Filled(b) = s {
                self.remaining -= 1;
                return Some(b.item);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for RawIntoIter<T> {}
impl<T> FusedIterator for RawIntoIter<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_at_home_when_free() {
        let mut t = RawTable::try_with_capacity(7).unwrap();
        assert_eq!(t.insert(3, "a"), Ok(3));
        assert_eq!(t.insert(10, "b"), Ok(4)); // 10 % 7 == 3, displaced by one
        assert_eq!(t.bucket(4).unwrap().dist, 1);
        assert_eq!(t.len(), 2);
        t.assert_displacements();
    }

    #[test]
    fn poorer_bucket_steals_slot() {
        let mut t = RawTable::try_with_capacity(7).unwrap();
        t.insert(2, 'x').unwrap(); // slot 2, dist 0
        t.insert(9, 'y').unwrap(); // home 2 -> slot 3, dist 1
        t.insert(3, 'z').unwrap(); // home 3 is taken by y (dist 1) -> slot 4
        // A fourth key homed at 2 travels past x and y, and at slot 4 it has
        // travelled 2 while z travelled 1: it takes slot 4 and z moves on.
        assert_eq!(t.insert(16, 'w'), Ok(4));
        assert_eq!(t.get(4), Some(&'w'));
        assert_eq!(t.get(5), Some(&'z'));
        assert_eq!(t.bucket(5).unwrap().dist, 2);
        t.assert_displacements();
        t.assert_robin_hood();
    }

    #[test]
    fn probes_wrap_around() {
        let mut t = RawTable::try_with_capacity(5).unwrap();
        t.insert(4, 1).unwrap();
        assert_eq!(t.insert(9, 2), Ok(0));
        assert_eq!(t.find(9, |&v| v == 2), Some(0));
        t.assert_displacements();
    }

    #[test]
    fn full_table_returns_item() {
        let mut t = RawTable::try_with_capacity(2).unwrap();
        t.insert(0, 'a').unwrap();
        t.insert(1, 'b').unwrap();
        assert_eq!(t.insert(0, 'c'), Err('c'));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn tombstone_keeps_probe_run_intact() {
        let mut t = RawTable::try_with_capacity(7).unwrap();
        t.insert(1, "first").unwrap();
        t.insert(8, "second").unwrap(); // slot 2
        assert_eq!(t.remove(1), Some("first"));
        assert_eq!(t.tombstones(), 1);
        // "second" is still found by walking over the tombstone at its home.
        assert_eq!(t.find(8, |s| *s == "second"), Some(2));
        assert_eq!(t.find(1, |s| *s == "first"), None);
        assert_eq!(t.remove(1), None);
    }

    #[test]
    fn insert_reuses_tombstone() {
        let mut t = RawTable::try_with_capacity(7).unwrap();
        t.insert(1, 'a').unwrap();
        t.remove(1).unwrap();
        assert_eq!(t.insert(1, 'b'), Ok(1));
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn find_terminates_without_empty_slots() {
        let mut t = RawTable::try_with_capacity(3).unwrap();
        for h in 0..3u64 {
            t.insert(h, h).unwrap();
        }
        t.remove(0).unwrap();
        t.remove(1).unwrap();
        // No empty slot left: the lap bound ends the probe.
        assert_eq!(t.find(0, |&v| v == 42), None);
        assert_eq!(t.find(2, |&v| v == 2), Some(2));
    }

    #[test]
    fn rehash_drops_tombstones_and_keeps_items() {
        let mut t = RawTable::try_with_capacity(11).unwrap();
        for h in 0..8u64 {
            t.insert(h * 11, h).unwrap(); // all collide on slot 0
        }
        t.assert_robin_hood();
        let idx = t.find(33, |&v| v == 3).unwrap();
        t.remove(idx).unwrap();
        t.rehash(53).unwrap();
        assert_eq!(t.capacity(), 53);
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.len(), 7);
        for h in (0..8u64).filter(|&h| h != 3) {
            assert!(t.find(h * 11, |&v| v == h).is_some());
        }
        t.assert_displacements();
    }

    #[test]
    fn rehash_refuses_too_small_target() {
        let mut t = RawTable::try_with_capacity(5).unwrap();
        for h in 0..3u64 {
            t.insert(h, h).unwrap();
        }
        assert_eq!(
            t.rehash(3),
            Err(ResizeError::TooSmall {
                requested: 3,
                count: 3
            })
        );
        assert_eq!(t.capacity(), 5);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn sparse_walk_helpers() {
        let mut t = RawTable::try_with_capacity(11).unwrap();
        for h in [2u64, 5, 9] {
            t.insert(h, h).unwrap();
        }
        assert_eq!(t.first_filled(), Some(2));
        assert_eq!(t.last_filled(), Some(9));
        assert_eq!(t.next_filled(2), Some(5));
        assert_eq!(t.next_filled(9), None);
        assert_eq!(t.prev_filled(9), Some(5));
        assert_eq!(t.prev_filled(2), None);
        assert_eq!(t.get(5), Some(&5));
        assert_eq!(t.get(6), None);
        assert_eq!(t.iter().rev().copied().collect::<Vec<_>>(), vec![9, 5, 2]);
        assert_eq!(t.iter().len(), 3);
    }

    #[test]
    fn crowded_counts_tombstones() {
        let mut t = RawTable::try_with_capacity(10).unwrap();
        for h in 0..5u64 {
            t.insert(h, h).unwrap();
        }
        assert!(!t.crowded(0.5));
        t.remove(0).unwrap();
        // 4 live + 1 tombstone == 5 == 10 * 0.5
        assert!(t.crowded(0.5));
    }

    #[test]
    fn drain_and_map_items() {
        let mut t = RawTable::try_with_capacity(7).unwrap();
        t.insert(1, 10).unwrap();
        t.insert(4, 40).unwrap();
        t.remove(1).unwrap();
        let doubled = t.map_items(|v| v * 2).unwrap();
        assert_eq!(doubled.tombstones(), 1);
        assert_eq!(doubled.get(4), Some(&80));
        let out: Vec<_> = t.drain().collect();
        assert_eq!(out, vec![40]);
        assert_eq!(t.len(), 0);
        assert_eq!(t.tombstones(), 0);
        assert_eq!(doubled.into_items().collect::<Vec<_>>(), vec![80]);
    }
}
