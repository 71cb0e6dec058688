//! HashSet: Robin Hood open addressing over a prime-sized slot array.
//!
//! Growth is checked before every insert: when one more element would
//! reach `capacity * load`, the table asks its `GrowthPolicy` for a bigger
//! capacity and rehashes from cached hashes. Removal leaves tombstones;
//! once live elements plus tombstones reach the threshold while live
//! elements alone do not, the table is rebuilt at the same size.

use crate::config::{GrowthPolicy, TableConfig};
use crate::cursor::{forward_cursor, Cursor, CursorSource, Position};
use crate::error::{ConfigError, InsertError, ResizeError};
use crate::guard::Busy;
use crate::primes::{at_threshold, plan_resize, ResizePlan};
use crate::raw::{RawIntoIter, RawIter, RawTable};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use log::{debug, trace, warn};
use std::collections::hash_map::RandomState;

#[derive(Clone)]
pub struct HashSet<T, S = RandomState> {
    table: RawTable<T>,
    load: f64,
    growth: GrowthPolicy,
    hasher: S,
    reentrancy: Busy,
}

impl<T> HashSet<T, RandomState> {
    /// Set able to hold `capacity` elements before growing.
    ///
    /// The real slot count is the tabulated prime at or above
    /// `capacity / load`; `load` must lie in `(0, 1)`.
    pub fn new(capacity: usize, load: f64) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new(capacity).load(load))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<T, S> HashSet<T, S> {
    pub fn with_hasher(capacity: usize, load: f64, hasher: S) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(TableConfig::new(capacity).load(load), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, ConfigError> {
        let capacity = config.validate()?;
        Ok(Self {
            table: RawTable::try_with_capacity(capacity)?,
            load: config.load,
            growth: config.growth,
            hasher,
            reentrancy: Busy::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// `true` once the element count has reached `capacity * load`.
    pub fn is_full(&self) -> bool {
        at_threshold(self.table.capacity(), self.load, self.table.len())
    }

    /// Number of slots, live or not.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load(&self) -> f64 {
        self.load
    }

    pub fn growth(&self) -> GrowthPolicy {
        self.growth
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Elements in slot order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.table.clear();
    }

    /// Empty the set, handing every element to `f`.
    pub fn clear_with(&mut self, mut f: impl FnMut(T)) {
        let _g = self.reentrancy.enter("clear_with");
        for v in self.table.drain() {
            f(v);
        }
    }

    /// Element-wise copy through `f`, keeping the slot layout.
    ///
    /// Cached hashes are reused, so `f` must return a value that hashes
    /// and compares like its argument.
    pub fn copy_with(&self, f: impl FnMut(&T) -> T) -> Result<Self, ResizeError>
    where
        S: Clone,
    {
        let _g = self.reentrancy.enter("copy_with");
        Ok(Self {
            table: self.table.map_items(f)?,
            load: self.load,
            growth: self.growth,
            hasher: self.hasher.clone(),
            reentrancy: Busy::new(),
        })
    }

    pub fn max(&self) -> Option<&T>
    where
        T: Ord,
    {
        self.iter().max()
    }

    pub fn min(&self) -> Option<&T>
    where
        T: Ord,
    {
        self.iter().min()
    }

    /// Panics if the table layout or the load bound is broken.
    #[cfg(test)]
    pub(crate) fn assert_layout(&self) {
        self.table.assert_displacements();
        assert!(self.table.len() as f64 <= self.table.capacity() as f64 * self.load);
        assert!(crate::primes::PRIMES.contains(&(self.table.capacity() as u64)));
    }

    fn resize_to(&mut self, requested: usize) -> Result<(), ResizeError> {
        let old = self.table.capacity();
        match plan_resize(old, requested, self.table.len(), self.load)? {
            ResizePlan::Keep => Ok(()),
            ResizePlan::Rehash(capacity) => {
                self.table.rehash(capacity)?;
                debug!(
                    "hash set resized from {} to {} slots ({} elements)",
                    old,
                    capacity,
                    self.table.len()
                );
                Ok(())
            }
        }
    }

    /// Grow or purge tombstones so that one more element fits.
    fn make_room(&mut self) -> Result<(), ResizeError> {
        let cap = self.table.capacity();
        if at_threshold(cap, self.load, self.table.len() + 1) {
            self.resize_to(self.growth.request(cap))
        } else if self.table.crowded(self.load) {
            trace!(
                "hash set purging {} tombstones at {} slots",
                self.table.tombstones(),
                cap
            );
            Ok(self.table.rehash(cap)?)
        } else {
            Ok(())
        }
    }
}

impl<T, S> HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn find_slot<Q>(&self, q: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table.find(hash, |v| v.borrow() == q)
    }

    /// Add `value`. A value already present is rejected and the set is
    /// left untouched.
    pub fn insert(&mut self, value: T) -> Result<(), InsertError> {
        let hash = {
            let _g = self.reentrancy.enter("insert");
            let hash = self.make_hash(&value);
            if self.table.find(hash, |v| *v == value).is_some() {
                return Err(InsertError::Duplicate);
            }
            hash
        };
        self.place(hash, value)
    }

    fn place(&mut self, hash: u64, value: T) -> Result<(), InsertError> {
        if let Err(e) = self.make_room() {
            warn!(
                "hash set insert rejected: growth from {} slots failed: {}",
                self.table.capacity(),
                e
            );
            return Err(e.into());
        }
        self.table
            .insert(hash, value)
            .map(|_| ())
            .map_err(|_| InsertError::Full)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove");
        let idx = self.find_slot(value)?;
        self.table.remove(idx)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains");
        self.find_slot(value).is_some()
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        self.find_slot(value).and_then(|i| self.table.get(i))
    }

    /// Make room for `capacity` elements at the current load factor.
    ///
    /// Never shrinks: a request the current table already covers is a
    /// no-op. On error the set keeps its previous table.
    pub fn resize(&mut self, capacity: usize) -> Result<(), ResizeError> {
        self.reentrancy.check("resize");
        self.resize_to(capacity)
    }

    /// Empty set sharing this set's load, growth policy and hasher.
    fn empty_like(&self, capacity: usize) -> Result<Self, ResizeError>
    where
        S: Clone,
    {
        Ok(Self {
            table: RawTable::try_with_capacity(capacity)?,
            load: self.load,
            growth: self.growth,
            hasher: self.hasher.clone(),
            reentrancy: Busy::new(),
        })
    }

    fn push_unique(&mut self, value: T) -> Result<(), InsertError> {
        let hash = self.make_hash(&value);
        self.place(hash, value)
    }

    /// Elements of either set.
    pub fn union(&self, other: &Self) -> Result<Self, InsertError>
    where
        T: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter("union");
        let mut out = self.empty_like(self.capacity())?;
        for v in self.iter() {
            out.push_unique(v.clone())?;
        }
        for v in other.iter() {
            if self.find_slot(v).is_none() {
                out.push_unique(v.clone())?;
            }
        }
        Ok(out)
    }

    /// Elements of both sets. Walks whichever set is smaller.
    pub fn intersection(&self, other: &Self) -> Result<Self, InsertError>
    where
        T: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter("intersection");
        let mut out = self.empty_like(self.capacity())?;
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        for v in small.iter() {
            if large.find_slot(v).is_some() {
                out.push_unique(v.clone())?;
            }
        }
        Ok(out)
    }

    /// Elements of `self` missing from `other`.
    pub fn difference(&self, other: &Self) -> Result<Self, InsertError>
    where
        T: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter("difference");
        let mut out = self.empty_like(self.capacity())?;
        for v in self.iter() {
            if other.find_slot(v).is_none() {
                out.push_unique(v.clone())?;
            }
        }
        Ok(out)
    }

    /// Elements in exactly one of the two sets.
    pub fn symmetric_difference(&self, other: &Self) -> Result<Self, InsertError>
    where
        T: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter("symmetric_difference");
        let mut out = self.empty_like(self.capacity())?;
        for v in self.iter() {
            if other.find_slot(v).is_none() {
                out.push_unique(v.clone())?;
            }
        }
        for v in other.iter() {
            if self.find_slot(v).is_none() {
                out.push_unique(v.clone())?;
            }
        }
        Ok(out)
    }

    /// `true` when every element of `self` is in `other`. The empty set is
    /// a subset of every set.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.find_slot(v).is_some())
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }

    pub fn is_proper_superset(&self, other: &Self) -> bool {
        other.is_proper_subset(self)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| large.find_slot(v).is_none())
    }
}

/// Same elements. Membership is checked from the set with fewer slots.
impl<T, S> PartialEq for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let (small, large) = if self.capacity() <= other.capacity() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| large.find_slot(v).is_some())
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
}

impl<T: fmt::Debug, S> fmt::Debug for HashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Duplicates are skipped. A failed growth is logged and the remaining
/// elements are dropped.
impl<T, S> Extend<T> for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            match self.insert(v) {
                Ok(()) | Err(InsertError::Duplicate) => {}
                Err(e) => {
                    warn!("hash set extend stopped early: {}", e);
                    return;
                }
            }
        }
    }
}

/// Iterator over the elements of a `HashSet`, in slot order.
pub struct Iter<'a, T> {
    inner: RawIter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Owning iterator over the elements of a `HashSet`.
pub struct IntoIter<T> {
    inner: RawIntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T, S> IntoIterator for HashSet<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.table.into_items(),
        }
    }
}

/// Bidirectional cursor over a `HashSet`.
pub struct SetCursor<'a, T> {
    inner: Position<'a, RawTable<T>>,
}

impl<T> Clone for SetCursor<'_, T> {
    fn clone(&self) -> Self {
        SetCursor {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Cursor for SetCursor<'a, T> {
    type Item = &'a T;

    forward_cursor!(inner);

    fn get(&self) -> Option<&'a T> {
        let table = self.inner.target();
        self.inner.pos().and_then(|i| table.get(i))
    }
}

impl<T, S> CursorSource for HashSet<T, S> {
    type Cursor<'a> = SetCursor<'a, T> where Self: 'a;

    fn cursor_start(&self) -> SetCursor<'_, T> {
        SetCursor {
            inner: Position::start(&self.table),
        }
    }

    fn cursor_end(&self) -> SetCursor<'_, T> {
        SetCursor {
            inner: Position::end(&self.table),
        }
    }
}
