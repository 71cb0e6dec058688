//! TreeMap: ordered map on an AVL tree.
//!
//! Nodes live in a `SlotMap` arena and link to their parent as well as
//! both children, so in-order successor and predecessor walks need no
//! stack. Each node stores the height of its subtree (a leaf has height
//! 1). After every insert or removal the path to the root is walked,
//! heights are refreshed and any node whose child heights differ by two
//! is rotated back into balance.

use crate::cursor::{forward_cursor, Cursor, CursorSource, Position, Walk};
use crate::error::InsertError;
use crate::guard::Busy;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use slotmap::{DefaultKey, SlotMap};

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    parent: Option<DefaultKey>,
    left: Option<DefaultKey>,
    right: Option<DefaultKey>,
    height: u32,
}

#[derive(Clone)]
pub struct TreeMap<K, V> {
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    root: Option<DefaultKey>,
    reentrancy: Busy,
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TreeMap<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            reentrancy: Busy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.nodes.clear();
        self.root = None;
    }

    /// Pairs in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            front: self.leftmost(self.root),
            back: self.rightmost(self.root),
            remaining: self.nodes.len(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn min(&self) -> Option<(&K, &V)> {
        self.pair(self.leftmost(self.root)?)
    }

    pub fn max(&self) -> Option<(&K, &V)> {
        self.pair(self.rightmost(self.root)?)
    }

    fn pair(&self, k: DefaultKey) -> Option<(&K, &V)> {
        self.nodes.get(k).map(|n| (&n.key, &n.value))
    }

    fn left(&self, k: DefaultKey) -> Option<DefaultKey> {
        self.nodes.get(k).and_then(|n| n.left)
    }

    fn right(&self, k: DefaultKey) -> Option<DefaultKey> {
        self.nodes.get(k).and_then(|n| n.right)
    }

    fn parent(&self, k: DefaultKey) -> Option<DefaultKey> {
        self.nodes.get(k).and_then(|n| n.parent)
    }

    fn height(&self, k: Option<DefaultKey>) -> u32 {
        k.and_then(|k| self.nodes.get(k)).map_or(0, |n| n.height)
    }

    fn set_left(&mut self, k: DefaultKey, child: Option<DefaultKey>) {
        if let Some(n) = self.nodes.get_mut(k) {
            n.left = child;
        }
    }

    fn set_right(&mut self, k: DefaultKey, child: Option<DefaultKey>) {
        if let Some(n) = self.nodes.get_mut(k) {
            n.right = child;
        }
    }

    fn set_parent(&mut self, k: Option<DefaultKey>, parent: Option<DefaultKey>) {
        if let Some(n) = k.and_then(|k| self.nodes.get_mut(k)) {
            n.parent = parent;
        }
    }

    fn leftmost(&self, mut k: Option<DefaultKey>) -> Option<DefaultKey> {
        while let Some(l) = k.and_then(|k| self.left(k)) {
            k = Some(l);
        }
        k
    }

    fn rightmost(&self, mut k: Option<DefaultKey>) -> Option<DefaultKey> {
        while let Some(r) = k.and_then(|k| self.right(k)) {
            k = Some(r);
        }
        k
    }

    /// In-order successor.
    fn successor(&self, k: DefaultKey) -> Option<DefaultKey> {
        if let Some(r) = self.right(k) {
            return self.leftmost(Some(r));
        }
        let mut child = k;
        let mut up = self.parent(k);
        while let Some(p) = up {
            if self.left(p) == Some(child) {
                return Some(p);
            }
            child = p;
            up = self.parent(p);
        }
        None
    }

    /// In-order predecessor.
    fn predecessor(&self, k: DefaultKey) -> Option<DefaultKey> {
        if let Some(l) = self.left(k) {
            return self.rightmost(Some(l));
        }
        let mut child = k;
        let mut up = self.parent(k);
        while let Some(p) = up {
            if self.right(p) == Some(child) {
                return Some(p);
            }
            child = p;
            up = self.parent(p);
        }
        None
    }

    /// Point whichever link of `parent` referred to `old` at `new`; the
    /// root when `parent` is `None`.
    fn replace_child(
        &mut self,
        parent: Option<DefaultKey>,
        old: DefaultKey,
        new: Option<DefaultKey>,
    ) {
        match parent {
            None => self.root = new,
            Some(p) if self.left(p) == Some(old) => self.set_left(p, new),
            Some(p) => self.set_right(p, new),
        }
    }

    fn update_height(&mut self, k: DefaultKey) {
        let h = 1 + self.height(self.left(k)).max(self.height(self.right(k)));
        if let Some(n) = self.nodes.get_mut(k) {
            n.height = h;
        }
    }

    /// Lift `x`'s right child into its place. Returns the new subtree root.
    fn rotate_left(&mut self, x: DefaultKey) -> DefaultKey {
        let Some(y) = self.right(x) else {
            return x;
        };
        let inner = self.left(y);
        let parent = self.parent(x);

        self.set_right(x, inner);
        self.set_parent(inner, Some(x));

        self.replace_child(parent, x, Some(y));
        self.set_parent(Some(y), parent);

        self.set_left(y, Some(x));
        self.set_parent(Some(x), Some(y));

        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Lift `x`'s left child into its place. Returns the new subtree root.
    fn rotate_right(&mut self, x: DefaultKey) -> DefaultKey {
        let Some(y) = self.left(x) else {
            return x;
        };
        let inner = self.right(y);
        let parent = self.parent(x);

        self.set_left(x, inner);
        self.set_parent(inner, Some(x));

        self.replace_child(parent, x, Some(y));
        self.set_parent(Some(y), parent);

        self.set_right(y, Some(x));
        self.set_parent(Some(x), Some(y));

        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Refresh heights from `from` up to the root, rotating wherever the
    /// child heights differ by two.
    fn rebalance(&mut self, mut from: Option<DefaultKey>) {
        while let Some(mut k) = from {
            self.update_height(k);
            let hl = self.height(self.left(k));
            let hr = self.height(self.right(k));
            if hr >= hl + 2 {
                if let Some(r) = self.right(k) {
                    if self.height(self.right(r)) < self.height(self.left(r)) {
                        self.rotate_right(r);
                    }
                }
                k = self.rotate_left(k);
            } else if hl >= hr + 2 {
                if let Some(l) = self.left(k) {
                    if self.height(self.left(l)) < self.height(self.right(l)) {
                        self.rotate_left(l);
                    }
                }
                k = self.rotate_right(k);
            }
            from = self.parent(k);
        }
    }

    /// Unlink node `k` from the tree and free it.
    fn detach(&mut self, k: DefaultKey) -> Option<(K, V)> {
        let (left, right) = {
            let n = self.nodes.get(k)?;
            (n.left, n.right)
        };
        let target = if let (Some(_), Some(r)) = (left, right) {
            // Two children: the successor (leftmost of the right subtree,
            // at most one child of its own) takes over k's payload and is
            // unlinked instead.
            let succ = self.leftmost(Some(r))?;
            let [a, b] = self.nodes.get_disjoint_mut([k, succ])?;
            mem::swap(&mut a.key, &mut b.key);
            mem::swap(&mut a.value, &mut b.value);
            succ
        } else {
            k
        };
        let child = self.left(target).or(self.right(target));
        let parent = self.parent(target);
        self.replace_child(parent, target, child);
        self.set_parent(child, parent);
        let node = self.nodes.remove(target)?;
        self.rebalance(parent);
        Some((node.key, node.value))
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    fn find<Q>(&self, key: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut cur = self.root;
        while let Some(k) = cur {
            let n = self.nodes.get(k)?;
            cur = match key.cmp(n.key.borrow()) {
                Ordering::Less => n.left,
                Ordering::Greater => n.right,
                Ordering::Equal => return Some(k),
            };
        }
        None
    }

    /// Add a pair. An existing key is rejected and the map is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        // Find the attachment point: parent and which side.
        let (parent, go_left) = {
            let _g = self.reentrancy.enter("insert");
            let mut parent = None;
            let mut go_left = false;
            let mut cur = self.root;
            while let Some(k) = cur {
                let Some(n) = self.nodes.get(k) else {
                    break;
                };
                parent = Some(k);
                match key.cmp(&n.key) {
                    Ordering::Less => {
                        go_left = true;
                        cur = n.left;
                    }
                    Ordering::Greater => {
                        go_left = false;
                        cur = n.right;
                    }
                    Ordering::Equal => return Err(InsertError::DuplicateKey),
                }
            }
            (parent, go_left)
        };
        let k = self.nodes.insert(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 1,
        });
        match parent {
            None => self.root = Some(k),
            Some(p) if go_left => self.set_left(p, Some(k)),
            Some(p) => self.set_right(p, Some(k)),
        }
        self.rebalance(parent);
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter("get");
        let k = self.find(key)?;
        self.nodes.get(k).map(|n| &n.value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter("get_key_value");
        let k = self.find(key)?;
        self.pair(k)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let k = {
            let _g = self.reentrancy.enter("get_mut");
            self.find(key)?
        };
        self.nodes.get_mut(k).map(|n| &mut n.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.find(key).is_some()
    }

    /// Replace the value under `key`, returning the old one.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let k = {
            let _g = self.reentrancy.enter("update");
            self.find(key)?
        };
        self.nodes
            .get_mut(k)
            .map(|n| mem::replace(&mut n.value, value))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let k = {
            let _g = self.reentrancy.enter("remove");
            self.find(key)?
        };
        self.detach(k)
    }

    /// Panics if a structural AVL or ordering invariant is broken.
    #[cfg(test)]
    pub(crate) fn assert_avl(&self) {
        fn check<K: Ord, V>(m: &TreeMap<K, V>, k: DefaultKey, parent: Option<DefaultKey>) -> u32 {
            let n = &m.nodes[k];
            assert_eq!(n.parent, parent, "parent link");
            let hl = n.left.map_or(0, |l| {
                assert!(m.nodes[l].key < n.key, "left child out of order");
                check(m, l, Some(k))
            });
            let hr = n.right.map_or(0, |r| {
                assert!(m.nodes[r].key > n.key, "right child out of order");
                check(m, r, Some(k))
            });
            assert!(hl.abs_diff(hr) <= 1, "unbalanced node");
            assert_eq!(n.height, 1 + hl.max(hr), "stale height");
            n.height
        }
        if let Some(root) = self.root {
            check(self, root, None);
        }
        assert_eq!(self.iter().count(), self.len());
        assert!(self
            .keys()
            .zip(self.keys().skip(1))
            .all(|(a, b)| a < b));
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for TreeMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Pairs whose key is already present are skipped.
impl<K: Ord, V> Extend<(K, V)> for TreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = TreeMap::new();
        m.extend(iter);
        m
    }
}

/// Iterator over the pairs of a `TreeMap` in key order.
pub struct Iter<'a, K, V> {
    map: &'a TreeMap<K, V>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        self.remaining -= 1;
        self.front = self.map.successor(k);
        self.map.pair(k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        self.remaining -= 1;
        self.back = self.map.predecessor(k);
        self.map.pair(k)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V> Walk for TreeMap<K, V> {
    type Pos = DefaultKey;

    fn count(&self) -> usize {
        self.nodes.len()
    }
    fn first_pos(&self) -> Option<DefaultKey> {
        self.leftmost(self.root)
    }
    fn last_pos(&self) -> Option<DefaultKey> {
        self.rightmost(self.root)
    }
    fn next_pos(&self, pos: DefaultKey) -> Option<DefaultKey> {
        self.successor(pos)
    }
    fn prev_pos(&self, pos: DefaultKey) -> Option<DefaultKey> {
        self.predecessor(pos)
    }
}

/// Bidirectional cursor over a `TreeMap`, in key order.
pub struct TreeCursor<'a, K, V> {
    inner: Position<'a, TreeMap<K, V>>,
}

impl<K, V> Clone for TreeCursor<'_, K, V> {
    fn clone(&self) -> Self {
        TreeCursor {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> TreeCursor<'a, K, V> {
    pub fn key(&self) -> Option<&'a K> {
        self.get().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.get().map(|(_, v)| v)
    }
}

impl<'a, K, V> Cursor for TreeCursor<'a, K, V> {
    type Item = (&'a K, &'a V);

    forward_cursor!(inner);

    fn get(&self) -> Option<(&'a K, &'a V)> {
        let map = self.inner.target();
        self.inner.pos().and_then(|k| map.pair(k))
    }
}

impl<K, V> CursorSource for TreeMap<K, V> {
    type Cursor<'a> = TreeCursor<'a, K, V> where Self: 'a;

    fn cursor_start(&self) -> TreeCursor<'_, K, V> {
        TreeCursor {
            inner: Position::start(self),
        }
    }

    fn cursor_end(&self) -> TreeCursor<'_, K, V> {
        TreeCursor {
            inner: Position::end(self),
        }
    }
}
