//! BidiMap: a one-to-one map searchable from either side.
//!
//! Entries live once in a `SlotMap` arena. Two Robin Hood tables index the
//! arena keys, one by key hash and one by value hash, each with its own
//! displacement bookkeeping. An entry is reachable from exactly one filled
//! slot in each table. Both tables always share one capacity.

use crate::config::{GrowthPolicy, TableConfig};
use crate::cursor::{forward_cursor, Cursor, CursorSource, Position};
use crate::error::{ConfigError, InsertError, ResizeError, UpdateError};
use crate::guard::Busy;
use crate::primes::{at_threshold, plan_resize, ResizePlan};
use crate::raw::{RawIter, RawTable};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use log::{debug, trace, warn};
use slotmap::{DefaultKey, SecondaryMap, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    key_hash: u64,
    val_hash: u64,
}

#[derive(Clone)]
pub struct BidiMap<K, V, S = RandomState> {
    keys: RawTable<DefaultKey>,
    vals: RawTable<DefaultKey>,
    entries: SlotMap<DefaultKey, Entry<K, V>>,
    load: f64,
    growth: GrowthPolicy,
    hasher: S,
    reentrancy: Busy,
}

impl<K, V> BidiMap<K, V, RandomState> {
    pub fn new(capacity: usize, load: f64) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new(capacity).load(load))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> BidiMap<K, V, S> {
    pub fn with_hasher(capacity: usize, load: f64, hasher: S) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(TableConfig::new(capacity).load(load), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, ConfigError> {
        let capacity = config.validate()?;
        Ok(Self {
            keys: RawTable::try_with_capacity(capacity)?,
            vals: RawTable::try_with_capacity(capacity)?,
            entries: SlotMap::with_key(),
            load: config.load,
            growth: config.growth,
            hasher,
            reentrancy: Busy::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        at_threshold(self.keys.capacity(), self.load, self.entries.len())
    }

    pub fn capacity(&self) -> usize {
        self.keys.capacity()
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

    /// Pairs in key-table slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.keys.iter(),
            entries: &self.entries,
        }
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.keys.clear();
        self.vals.clear();
        self.entries.clear();
    }

    /// Empty the map, handing every pair to `f` in key-table order.
    pub fn clear_with(&mut self, mut f: impl FnMut(K, V)) {
        let _g = self.reentrancy.enter("clear_with");
        self.vals.clear();
        for e in self.keys.drain() {
            if let Some(entry) = self.entries.remove(e) {
                f(entry.key, entry.value);
            }
        }
        self.entries.clear();
    }

    /// Pairwise copy through `fk` and `fv` keeping both table layouts.
    /// Cached hashes are reused, so the copies must hash and compare like
    /// the originals.
    pub fn copy_with(
        &self,
        mut fk: impl FnMut(&K) -> K,
        mut fv: impl FnMut(&V) -> V,
    ) -> Result<Self, ResizeError>
    where
        S: Clone,
    {
        let _g = self.reentrancy.enter("copy_with");
        let mut entries = SlotMap::with_capacity_and_key(self.entries.len());
        let mut moved: SecondaryMap<DefaultKey, DefaultKey> = SecondaryMap::new();
        for (old, e) in &self.entries {
            let new = entries.insert(Entry {
                key: fk(&e.key),
                value: fv(&e.value),
                key_hash: e.key_hash,
                val_hash: e.val_hash,
            });
            moved.insert(old, new);
        }
        let remap = |e: &DefaultKey| moved.get(*e).copied().unwrap_or_default();
        Ok(Self {
            keys: self.keys.map_items(remap)?,
            vals: self.vals.map_items(remap)?,
            entries,
            load: self.load,
            growth: self.growth,
            hasher: self.hasher.clone(),
            reentrancy: Busy::new(),
        })
    }

    /// Rebuild both tables at `capacity` slots. Both are allocated before
    /// either moves, so a failure leaves the map untouched.
    fn rehash(&mut self, capacity: usize) -> Result<(), ResizeError> {
        if capacity <= self.entries.len() {
            return Err(ResizeError::TooSmall {
                requested: capacity,
                count: self.entries.len(),
            });
        }
        let fresh_keys = RawTable::try_with_capacity(capacity)?;
        let fresh_vals = RawTable::try_with_capacity(capacity)?;
        self.keys.move_into(fresh_keys);
        self.vals.move_into(fresh_vals);
        Ok(())
    }

    fn resize_to(&mut self, requested: usize) -> Result<(), ResizeError> {
        let old = self.keys.capacity();
        match plan_resize(old, requested, self.entries.len(), self.load)? {
            ResizePlan::Keep => Ok(()),
            ResizePlan::Rehash(capacity) => {
                self.rehash(capacity)?;
                debug!(
                    "bidimap resized from {} to {} slots ({} entries)",
                    old,
                    capacity,
                    self.entries.len()
                );
                Ok(())
            }
        }
    }

    fn make_room(&mut self) -> Result<(), ResizeError> {
        let cap = self.keys.capacity();
        if at_threshold(cap, self.load, self.entries.len() + 1) {
            self.resize_to(self.growth.request(cap))
        } else {
            self.purge()
        }
    }

    /// Same-capacity rebuild once tombstones crowd either table.
    fn purge(&mut self) -> Result<(), ResizeError> {
        if !self.keys.crowded(self.load) && !self.vals.crowded(self.load) {
            return Ok(());
        }
        let cap = self.keys.capacity();
        trace!(
            "bidimap purging {} key and {} value tombstones at {} slots",
            self.keys.tombstones(),
            self.vals.tombstones(),
            cap
        );
        self.rehash(cap)
    }

    /// Store `entry` in the arena and index it in both tables. When a
    /// placement finds no free slot, the key slot already taken becomes a
    /// tombstone again and the arena entry is freed.
    fn place(
        keys: &mut RawTable<DefaultKey>,
        vals: &mut RawTable<DefaultKey>,
        entries: &mut SlotMap<DefaultKey, Entry<K, V>>,
        entry: Entry<K, V>,
    ) -> Result<(), InsertError> {
        let (key_hash, val_hash) = (entry.key_hash, entry.val_hash);
        let e = entries.insert(entry);
        if keys.insert(key_hash, e).is_err() {
            entries.remove(e);
            return Err(InsertError::Full);
        }
        if vals.insert(val_hash, e).is_err() {
            if let Some(slot) = Self::slot_of(keys, key_hash, e) {
                keys.remove(slot);
            }
            entries.remove(e);
            return Err(InsertError::Full);
        }
        Ok(())
    }

    /// Tombstone-purge after an update, which never fails the update
    /// itself.
    fn purge_after_update(&mut self, op: &str) {
        if let Err(e) = self.purge() {
            warn!("bidimap {} kept its tombstones: purge failed: {}", op, e);
        }
    }

    /// Slot in `table` that refers to arena entry `e`. Compares arena keys
    /// only, so no user code runs.
    fn slot_of(table: &RawTable<DefaultKey>, hash: u64, e: DefaultKey) -> Option<usize> {
        table.find(hash, |&x| x == e)
    }
}

impl<K, V, S> BidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn find_key<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let entries = &self.entries;
        self.keys.find(hash, |&e| {
            entries.get(e).map_or(false, |en| en.key.borrow() == q)
        })
    }

    fn find_val<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        V: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let entries = &self.entries;
        self.vals.find(hash, |&e| {
            entries.get(e).map_or(false, |en| en.value.borrow() == q)
        })
    }

    fn entry_by_key<Q>(&self, key: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find_key(self.make_hash(key), key)?;
        self.keys.get(slot).copied()
    }

    fn entry_by_val<Q>(&self, val: &Q) -> Option<DefaultKey>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find_val(self.make_hash(val), val)?;
        self.vals.get(slot).copied()
    }

    /// Add a pair. Rejected, with nothing changed, when either the key or
    /// the value is already mapped.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let (key_hash, val_hash) = {
            let _g = self.reentrancy.enter("insert");
            let key_hash = self.make_hash(&key);
            if self.find_key(key_hash, &key).is_some() {
                return Err(InsertError::DuplicateKey);
            }
            let val_hash = self.make_hash(&value);
            if self.find_val(val_hash, &value).is_some() {
                return Err(InsertError::DuplicateValue);
            }
            (key_hash, val_hash)
        };
        if let Err(e) = self.make_room() {
            warn!(
                "bidimap insert rejected: growth from {} slots failed: {}",
                self.keys.capacity(),
                e
            );
            return Err(e.into());
        }
        Self::place(
            &mut self.keys,
            &mut self.vals,
            &mut self.entries,
            Entry {
                key,
                value,
                key_hash,
                val_hash,
            },
        )
    }

    /// Value mapped to `key`.
    pub fn get_val<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_val");
        let e = self.entry_by_key(key)?;
        self.entries.get(e).map(|en| &en.value)
    }

    /// Key mapped to `val`.
    pub fn get_key<Q>(&self, val: &Q) -> Option<&K>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_key");
        let e = self.entry_by_val(val)?;
        self.entries.get(e).map(|en| &en.key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.entry_by_key(key).is_some()
    }

    pub fn contains_val<Q>(&self, val: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_val");
        self.entry_by_val(val).is_some()
    }

    /// Give the pair holding `val` a new key and return the old one.
    ///
    /// Succeeds without change when `new_key` is already that pair's key;
    /// fails with `DuplicateKey` when it belongs to another pair.
    pub fn update_key<Q>(&mut self, val: &Q, new_key: K) -> Result<K, UpdateError>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (e, new_hash) = {
            let _g = self.reentrancy.enter("update_key");
            let e = self.entry_by_val(val).ok_or(UpdateError::NotFound)?;
            let entry = self.entries.get(e).ok_or(UpdateError::NotFound)?;
            if entry.key == new_key {
                return Ok(new_key);
            }
            let new_hash = self.make_hash(&new_key);
            if self.find_key(new_hash, &new_key).is_some() {
                return Err(UpdateError::DuplicateKey);
            }
            (e, new_hash)
        };
        let entry = self.entries.get_mut(e).ok_or(UpdateError::NotFound)?;
        let slot = Self::slot_of(&self.keys, entry.key_hash, e).ok_or(UpdateError::NotFound)?;
        self.keys.remove(slot);
        entry.key_hash = new_hash;
        let old = mem::replace(&mut entry.key, new_key);
        // The slot just vacated guarantees room.
        let placed = self.keys.insert(new_hash, e);
        debug_assert!(placed.is_ok());
        self.purge_after_update("update_key");
        Ok(old)
    }

    /// Give the pair holding `key` a new value and return the old one.
    /// Mirror image of `update_key`.
    pub fn update_val<Q>(&mut self, key: &Q, new_val: V) -> Result<V, UpdateError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (e, new_hash) = {
            let _g = self.reentrancy.enter("update_val");
            let e = self.entry_by_key(key).ok_or(UpdateError::NotFound)?;
            let entry = self.entries.get(e).ok_or(UpdateError::NotFound)?;
            if entry.value == new_val {
                return Ok(new_val);
            }
            let new_hash = self.make_hash(&new_val);
            if self.find_val(new_hash, &new_val).is_some() {
                return Err(UpdateError::DuplicateValue);
            }
            (e, new_hash)
        };
        let entry = self.entries.get_mut(e).ok_or(UpdateError::NotFound)?;
        let slot = Self::slot_of(&self.vals, entry.val_hash, e).ok_or(UpdateError::NotFound)?;
        self.vals.remove(slot);
        entry.val_hash = new_hash;
        let old = mem::replace(&mut entry.value, new_val);
        let placed = self.vals.insert(new_hash, e);
        debug_assert!(placed.is_ok());
        self.purge_after_update("update_val");
        Ok(old)
    }

    fn remove_entry(&mut self, e: DefaultKey) -> Option<(K, V)> {
        let entry = self.entries.get(e)?;
        let kslot = Self::slot_of(&self.keys, entry.key_hash, e)?;
        let vslot = Self::slot_of(&self.vals, entry.val_hash, e)?;
        self.keys.remove(kslot);
        self.vals.remove(vslot);
        self.entries.remove(e).map(|en| (en.key, en.value))
    }

    pub fn remove_by_key<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let e = {
            let _g = self.reentrancy.enter("remove_by_key");
            self.entry_by_key(key)?
        };
        self.remove_entry(e)
    }

    pub fn remove_by_val<Q>(&mut self, val: &Q) -> Option<(K, V)>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let e = {
            let _g = self.reentrancy.enter("remove_by_val");
            self.entry_by_val(val)?
        };
        self.remove_entry(e)
    }

    /// Same rules as `HashSet::resize`; both tables move together.
    pub fn resize(&mut self, capacity: usize) -> Result<(), ResizeError> {
        self.reentrancy.check("resize");
        self.resize_to(capacity)
    }
}

/// Same number of pairs and every key maps to an equal value in both.
impl<K, V, S> PartialEq for BidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                other
                    .entry_by_key(k)
                    .and_then(|e| other.entries.get(e))
                    .map_or(false, |en| en.value == *v)
            })
    }
}

impl<K, V, S> Eq for BidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for BidiMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Pairs whose key or value is already mapped are skipped. A failed
/// growth is logged and the remaining pairs are dropped.
impl<K, V, S> Extend<(K, V)> for BidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            match self.insert(k, v) {
                Ok(()) | Err(InsertError::DuplicateKey) | Err(InsertError::DuplicateValue) => {}
                Err(e) => {
                    warn!("bidimap extend stopped early: {}", e);
                    return;
                }
            }
        }
    }
}

/// Iterator over the pairs of a `BidiMap`, in key-table slot order.
pub struct Iter<'a, K, V> {
    slots: RawIter<'a, DefaultKey>,
    entries: &'a SlotMap<DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let e = self.slots.next()?;
        self.entries.get(*e).map(|en| (&en.key, &en.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a BidiMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Bidirectional cursor over a `BidiMap`, ordered by key-table slots.
pub struct BidiCursor<'a, K, V> {
    inner: Position<'a, RawTable<DefaultKey>>,
    entries: &'a SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V> Clone for BidiCursor<'_, K, V> {
    fn clone(&self) -> Self {
        BidiCursor {
            inner: self.inner.clone(),
            entries: self.entries,
        }
    }
}

impl<'a, K, V> BidiCursor<'a, K, V> {
    pub fn key(&self) -> Option<&'a K> {
        self.get().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.get().map(|(_, v)| v)
    }
}

impl<'a, K, V> Cursor for BidiCursor<'a, K, V> {
    type Item = (&'a K, &'a V);

    forward_cursor!(inner);

    fn get(&self) -> Option<(&'a K, &'a V)> {
        let table = self.inner.target();
        let e = self.inner.pos().and_then(|i| table.get(i))?;
        self.entries.get(*e).map(|en| (&en.key, &en.value))
    }
}

impl<K, V, S> CursorSource for BidiMap<K, V, S> {
    type Cursor<'a> = BidiCursor<'a, K, V> where Self: 'a;

    fn cursor_start(&self) -> BidiCursor<'_, K, V> {
        BidiCursor {
            inner: Position::start(&self.keys),
            entries: &self.entries,
        }
    }

    fn cursor_end(&self) -> BidiCursor<'_, K, V> {
        BidiCursor {
            inner: Position::end(&self.keys),
            entries: &self.entries,
        }
    }
}
