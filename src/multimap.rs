//! MultiMap: separate chaining with many values per key.
//!
//! Buckets hold the head and tail of a doubly linked chain of nodes that
//! live in a `SlotMap` arena. Every key hashes to one bucket and new nodes
//! are appended at the tail, so the nodes for one key always appear in
//! insertion order when the chain is walked from the head. Lookups,
//! updates and removals act on the oldest node for a key.

use crate::config::{GrowthPolicy, TableConfig};
use crate::cursor::{forward_cursor, Cursor, CursorSource, Position, Walk};
use crate::error::{ConfigError, InsertError, ResizeError, UpdateError};
use crate::guard::Busy;
use crate::primes::{at_threshold, next_prime, plan_resize, ResizePlan};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use log::{debug, warn};
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;
use std::collections::TryReserveError;

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Chain {
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

fn alloc_chains(capacity: usize) -> Result<Vec<Chain>, TryReserveError> {
    let mut chains = Vec::new();
    chains.try_reserve_exact(capacity)?;
    chains.resize(capacity, Chain::default());
    Ok(chains)
}

#[inline]
fn bucket_index(hash: u64, buckets: usize) -> usize {
    (hash % buckets as u64) as usize
}

/// Append `k` at the tail of `chains[b]`.
fn link_tail<K, V>(
    chains: &mut [Chain],
    nodes: &mut SlotMap<DefaultKey, Node<K, V>>,
    b: usize,
    k: DefaultKey,
) {
    let tail = chains[b].tail;
    if let Some(n) = nodes.get_mut(k) {
        n.prev = tail;
        n.next = None;
    }
    match tail.and_then(|t| nodes.get_mut(t)) {
        Some(t) => t.next = Some(k),
        None => chains[b].head = Some(k),
    }
    chains[b].tail = Some(k);
}

#[derive(Clone)]
pub struct MultiMap<K, V, S = RandomState> {
    buckets: Vec<Chain>,
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    load: f64,
    growth: GrowthPolicy,
    hasher: S,
    reentrancy: Busy,
}

impl<K, V> MultiMap<K, V, RandomState> {
    /// Map sized for `capacity` entries at `load` entries per bucket.
    /// Chains make any positive finite load valid, including loads above 1.
    pub fn new(capacity: usize, load: f64) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new(capacity).load(load).growth(Self::DEFAULT_GROWTH))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> MultiMap<K, V, S> {
    /// Policy used by `new` and `with_hasher`.
    pub const DEFAULT_GROWTH: GrowthPolicy = GrowthPolicy::Factor(1.5);

    pub fn with_hasher(capacity: usize, load: f64, hasher: S) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(
            TableConfig::new(capacity)
                .load(load)
                .growth(Self::DEFAULT_GROWTH),
            hasher,
        )
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, ConfigError> {
        let capacity = config.validate_chained()?;
        Ok(Self {
            buckets: alloc_chains(capacity)?,
            nodes: SlotMap::with_key(),
            load: config.load,
            growth: config.growth,
            hasher,
            reentrancy: Busy::new(),
        })
    }

    /// Total number of key-value pairs.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        at_threshold(self.buckets.len(), self.load, self.nodes.len())
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
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

    /// Pairs in bucket order, oldest first within each key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.buckets,
            nodes: &self.nodes,
            bucket: 0,
            cur: None,
            remaining: self.nodes.len(),
        }
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.buckets.fill(Chain::default());
        self.nodes.clear();
    }

    /// Empty the map, handing every pair to `f` in bucket order.
    pub fn clear_with(&mut self, mut f: impl FnMut(K, V)) {
        let _g = self.reentrancy.enter("clear_with");
        for b in 0..self.buckets.len() {
            let mut cur = mem::take(&mut self.buckets[b]).head;
            while let Some(k) = cur {
                let Some(node) = self.nodes.remove(k) else {
                    break;
                };
                cur = node.next;
                f(node.key, node.value);
            }
        }
        self.nodes.clear();
    }

    /// Pairwise copy through `fk` and `fv`, keeping bucket count and
    /// chain order. Cached hashes are reused, so `fk` must return a key
    /// that hashes and compares like its argument.
    pub fn copy_with(
        &self,
        mut fk: impl FnMut(&K) -> K,
        mut fv: impl FnMut(&V) -> V,
    ) -> Result<Self, ResizeError>
    where
        S: Clone,
    {
        let _g = self.reentrancy.enter("copy_with");
        let mut out = Self {
            buckets: alloc_chains(self.buckets.len())?,
            nodes: SlotMap::with_capacity_and_key(self.nodes.len()),
            load: self.load,
            growth: self.growth,
            hasher: self.hasher.clone(),
            reentrancy: Busy::new(),
        };
        for (b, chain) in self.buckets.iter().enumerate() {
            let mut cur = chain.head;
            while let Some(n) = cur.and_then(|k| self.nodes.get(k)) {
                let k = out.nodes.insert(Node {
                    key: fk(&n.key),
                    value: fv(&n.value),
                    hash: n.hash,
                    prev: None,
                    next: None,
                });
                link_tail(&mut out.buckets, &mut out.nodes, b, k);
                cur = n.next;
            }
        }
        Ok(out)
    }

    /// Pair with the greatest key; the first one in iteration order when
    /// several nodes share it.
    pub fn max(&self) -> Option<(&K, &V)>
    where
        K: Ord,
    {
        let _g = self.reentrancy.enter("max");
        let mut best: Option<(&K, &V)> = None;
        for (k, v) in self.iter() {
            if best.map_or(true, |(bk, _)| k > bk) {
                best = Some((k, v));
            }
        }
        best
    }

    /// Pair with the smallest key; the first one in iteration order when
    /// several nodes share it.
    pub fn min(&self) -> Option<(&K, &V)>
    where
        K: Ord,
    {
        let _g = self.reentrancy.enter("min");
        let mut best: Option<(&K, &V)> = None;
        for (k, v) in self.iter() {
            if best.map_or(true, |(bk, _)| k < bk) {
                best = Some((k, v));
            }
        }
        best
    }

    fn rehash(&mut self, capacity: usize) -> Result<(), ResizeError> {
        let mut chains = alloc_chains(capacity)?;
        for b in 0..self.buckets.len() {
            let mut cur = self.buckets[b].head;
            while let Some(k) = cur {
                let Some(node) = self.nodes.get(k) else {
                    break;
                };
                cur = node.next;
                let nb = bucket_index(node.hash, capacity);
                link_tail(&mut chains, &mut self.nodes, nb, k);
            }
        }
        self.buckets = chains;
        Ok(())
    }

    fn resize_to(&mut self, requested: usize) -> Result<(), ResizeError> {
        let old = self.buckets.len();
        match plan_resize(old, requested, self.nodes.len(), self.load)? {
            ResizePlan::Keep => Ok(()),
            ResizePlan::Rehash(capacity) => {
                self.rehash(capacity)?;
                debug!(
                    "multimap resized from {} to {} buckets ({} entries)",
                    old,
                    capacity,
                    self.nodes.len()
                );
                Ok(())
            }
        }
    }

    /// Rebuild with the bucket count the growth policy asks for.
    ///
    /// The request is already in buckets, so it is only re-primed and not
    /// divided by the load as an explicit `resize` would.
    fn grow(&mut self) -> Result<(), ResizeError> {
        let old = self.buckets.len();
        let capacity = next_prime(self.growth.request(old));
        if capacity <= old {
            return Err(ResizeError::Overflow {
                requested: capacity,
            });
        }
        self.rehash(capacity)?;
        debug!(
            "multimap grew from {} to {} buckets ({} entries)",
            old,
            capacity,
            self.nodes.len()
        );
        Ok(())
    }

    /// Detach node `k` from its chain and free it.
    fn unlink(&mut self, k: DefaultKey) -> Option<Node<K, V>> {
        let node = self.nodes.remove(k)?;
        let b = bucket_index(node.hash, self.buckets.len());
        match node.prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.next = node.next,
            None => self.buckets[b].head = node.next,
        }
        match node.next.and_then(|n| self.nodes.get_mut(n)) {
            Some(n) => n.prev = node.prev,
            None => self.buckets[b].tail = node.prev,
        }
        Some(node)
    }
}

impl<K, V, S> MultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Nodes whose key equals `q`, oldest first.
    fn matching<'a, Q>(&'a self, q: &'a Q) -> Matches<'a, K, V, Q>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        Matches {
            nodes: &self.nodes,
            cur: self.buckets[bucket_index(hash, self.buckets.len())].head,
            hash,
            key: q,
        }
    }

    fn first_match<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.matching(q).next()
    }

    /// Append a pair. Existing pairs with the same key are kept.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let hash = {
            let _g = self.reentrancy.enter("insert");
            self.make_hash(&key)
        };
        while at_threshold(self.buckets.len(), self.load, self.nodes.len() + 1) {
            if let Err(e) = self.grow() {
                warn!(
                    "multimap insert rejected: growth from {} buckets failed: {}",
                    self.buckets.len(),
                    e
                );
                return Err(e.into());
            }
        }
        let k = self.nodes.insert(Node {
            key,
            value,
            hash,
            prev: None,
            next: None,
        });
        let b = bucket_index(hash, self.buckets.len());
        link_tail(&mut self.buckets, &mut self.nodes, b, k);
        Ok(())
    }

    /// Value of the oldest pair with `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let k = self.first_match(key)?;
        self.nodes.get(k).map(|n| &n.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = {
            let _g = self.reentrancy.enter("get_mut");
            self.first_match(key)?
        };
        self.nodes.get_mut(k).map(|n| &mut n.value)
    }

    /// Every value stored under `key`, oldest first.
    pub fn get_all<'a, Q>(&'a self, key: &'a Q) -> GetAll<'a, K, V, Q>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        GetAll {
            inner: self.matching(key),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.first_match(key).is_some()
    }

    /// Number of pairs stored under `key`. Walks one bucket.
    pub fn key_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("key_count");
        self.matching(key).count()
    }

    /// Replace the value of the oldest pair with `key`, returning the old
    /// value.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Result<V, UpdateError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = {
            let _g = self.reentrancy.enter("update");
            self.first_match(key).ok_or(UpdateError::NotFound)?
        };
        let node = self.nodes.get_mut(k).ok_or(UpdateError::NotFound)?;
        Ok(mem::replace(&mut node.value, value))
    }

    /// Replace the value of every pair with `key`. Old values come back
    /// oldest first; the result is empty when the key is absent.
    pub fn update_all<Q>(&mut self, key: &Q, value: V) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        let targets: Vec<DefaultKey> = {
            let _g = self.reentrancy.enter("update_all");
            self.matching(key).collect()
        };
        let mut old = Vec::with_capacity(targets.len());
        for k in targets {
            if let Some(n) = self.nodes.get_mut(k) {
                old.push(mem::replace(&mut n.value, value.clone()));
            }
        }
        old
    }

    /// Remove the oldest pair with `key` and return its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = {
            let _g = self.reentrancy.enter("remove");
            self.first_match(key)?
        };
        self.unlink(k).map(|n| n.value)
    }

    /// Remove every pair with `key`; values come back oldest first.
    pub fn remove_all<Q>(&mut self, key: &Q) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let targets: Vec<DefaultKey> = {
            let _g = self.reentrancy.enter("remove_all");
            self.matching(key).collect()
        };
        targets
            .into_iter()
            .filter_map(|k| self.unlink(k))
            .map(|n| n.value)
            .collect()
    }

    /// Same rules as `HashSet::resize`, with the count being all pairs.
    pub fn resize(&mut self, capacity: usize) -> Result<(), ResizeError> {
        self.reentrancy.check("resize");
        self.resize_to(capacity)
    }

    /// Key-level comparison.
    ///
    /// With `ignore_key_count`, `true` when every key of `self` occurs in
    /// `other`. Otherwise both maps must hold the same number of pairs and
    /// every key of `self` must occur equally often in both. Values are
    /// not compared.
    pub fn equals_keys(&self, other: &Self, ignore_key_count: bool) -> bool {
        let _g = self.reentrancy.enter("equals_keys");
        if ignore_key_count {
            return self.iter().all(|(k, _)| other.first_match(k).is_some());
        }
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, _)| self.matching(k).count() == other.matching(k).count())
    }
}

/// Same number of pairs and, for every key, the same values in the same
/// order.
impl<K, V, S> PartialEq for MultiMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(k, _)| {
            let ours = self.matching(k).filter_map(|n| self.nodes.get(n));
            let theirs = other.matching(k).filter_map(|n| other.nodes.get(n));
            ours.map(|n| &n.value).eq(theirs.map(|n| &n.value))
        })
    }
}

impl<K, V, S> Eq for MultiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for MultiMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// A failed growth is logged and the remaining pairs are dropped.
impl<K, V, S> Extend<(K, V)> for MultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            if let Err(e) = self.insert(k, v) {
                warn!("multimap extend stopped early: {}", e);
                return;
            }
        }
    }
}

/// Node keys in one chain whose key matches.
struct Matches<'a, K, V, Q: ?Sized> {
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    cur: Option<DefaultKey>,
    hash: u64,
    key: &'a Q,
}

impl<K, V, Q> Iterator for Matches<'_, K, V, Q>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    type Item = DefaultKey;

    fn next(&mut self) -> Option<DefaultKey> {
        while let Some(k) = self.cur {
            let node = self.nodes.get(k)?;
            self.cur = node.next;
            if node.hash == self.hash && node.key.borrow() == self.key {
                return Some(k);
            }
        }
        None
    }
}

/// Values stored under one key, oldest first.
pub struct GetAll<'a, K, V, Q: ?Sized> {
    inner: Matches<'a, K, V, Q>,
}

impl<'a, K, V, Q> Iterator for GetAll<'a, K, V, Q>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        let nodes = self.inner.nodes;
        self.inner.next().and_then(|k| nodes.get(k)).map(|n| &n.value)
    }
}

impl<K, V, Q> FusedIterator for GetAll<'_, K, V, Q>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
}

/// Iterator over the pairs of a `MultiMap`, bucket by bucket.
pub struct Iter<'a, K, V> {
    buckets: &'a [Chain],
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    bucket: usize,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        loop {
            if let Some(k) = self.cur {
                let node = self.nodes.get(k)?;
                self.cur = node.next;
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            let chain = self.buckets.get(self.bucket)?;
            self.bucket += 1;
            self.cur = chain.head;
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a MultiMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// A cursor position is a bucket index plus a node in that bucket's chain.
impl<K, V, S> Walk for MultiMap<K, V, S> {
    type Pos = (usize, DefaultKey);

    fn count(&self) -> usize {
        self.nodes.len()
    }

    fn first_pos(&self) -> Option<(usize, DefaultKey)> {
        self.buckets
            .iter()
            .enumerate()
            .find_map(|(b, c)| c.head.map(|k| (b, k)))
    }

    fn last_pos(&self) -> Option<(usize, DefaultKey)> {
        self.buckets
            .iter()
            .enumerate()
            .rev()
            .find_map(|(b, c)| c.tail.map(|k| (b, k)))
    }

    fn next_pos(&self, (b, k): (usize, DefaultKey)) -> Option<(usize, DefaultKey)> {
        if let Some(next) = self.nodes.get(k)?.next {
            return Some((b, next));
        }
        self.buckets
            .iter()
            .enumerate()
            .skip(b + 1)
            .find_map(|(b, c)| c.head.map(|k| (b, k)))
    }

    fn prev_pos(&self, (b, k): (usize, DefaultKey)) -> Option<(usize, DefaultKey)> {
        if let Some(prev) = self.nodes.get(k)?.prev {
            return Some((b, prev));
        }
        self.buckets[..b]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(b, c)| c.tail.map(|k| (b, k)))
    }
}

/// Bidirectional cursor over a `MultiMap`.
pub struct MultiMapCursor<'a, K, V, S> {
    inner: Position<'a, MultiMap<K, V, S>>,
}

impl<K, V, S> Clone for MultiMapCursor<'_, K, V, S> {
    fn clone(&self) -> Self {
        MultiMapCursor {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, S> MultiMapCursor<'a, K, V, S> {
    pub fn key(&self) -> Option<&'a K> {
        self.get().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.get().map(|(_, v)| v)
    }
}

impl<'a, K, V, S> Cursor for MultiMapCursor<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    forward_cursor!(inner);

    fn get(&self) -> Option<(&'a K, &'a V)> {
        let map = self.inner.target();
        let (_, k) = self.inner.pos()?;
        map.nodes.get(k).map(|n| (&n.key, &n.value))
    }
}

impl<K, V, S> CursorSource for MultiMap<K, V, S> {
    type Cursor<'a> = MultiMapCursor<'a, K, V, S> where Self: 'a;

    fn cursor_start(&self) -> MultiMapCursor<'_, K, V, S> {
        MultiMapCursor {
            inner: Position::start(self),
        }
    }

    fn cursor_end(&self) -> MultiMapCursor<'_, K, V, S> {
        MultiMapCursor {
            inner: Position::end(self),
        }
    }
}
