//! TreeSet: ordered set over `TreeMap<T, ()>`.

use crate::cursor::{Cursor, CursorSource};
use crate::error::InsertError;
use crate::tree_map::{TreeCursor, TreeMap};
use core::borrow::Borrow;
use core::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct TreeSet<T> {
    map: TreeMap<T, ()>,
}

impl<T> Default for TreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeSet<T> {
    pub fn new() -> Self {
        Self {
            map: TreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.map.keys()
    }

    pub fn min(&self) -> Option<&T> {
        self.map.min().map(|(k, _)| k)
    }

    pub fn max(&self) -> Option<&T> {
        self.map.max().map(|(k, _)| k)
    }
}

impl<T: Ord> TreeSet<T> {
    pub fn insert(&mut self, item: T) -> Result<(), InsertError> {
        self.map.insert(item, ()).map_err(|e| match e {
            InsertError::DuplicateKey => InsertError::Duplicate,
            other => other,
        })
    }

    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.contains_key(item)
    }

    pub fn get<Q>(&self, item: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.get_key_value(item).map(|(k, _)| k)
    }

    /// Remove and return the stored element equal to `item`.
    pub fn remove<Q>(&mut self, item: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.remove_entry(item).map(|(k, _)| k)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|x| other.contains(x))
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
        !small.iter().any(|x| large.contains(x))
    }
}

impl<T: Ord + Clone> TreeSet<T> {
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.extend(other.iter().cloned());
        out
    }

    pub fn intersection(&self, other: &Self) -> Self {
        self.iter().filter(|x| other.contains(*x)).cloned().collect()
    }

    pub fn difference(&self, other: &Self) -> Self {
        self.iter().filter(|x| !other.contains(*x)).cloned().collect()
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut out = self.difference(other);
        out.extend(other.iter().filter(|x| !self.contains(*x)).cloned());
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for TreeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Elements already present are skipped.
impl<T: Ord> Extend<T> for TreeSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            let _ = self.insert(item);
        }
    }
}

impl<T: Ord> FromIterator<T> for TreeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut s = TreeSet::new();
        s.extend(iter);
        s
    }
}

/// Cursor over a `TreeSet`, in ascending order.
pub struct TreeSetCursor<'a, T> {
    inner: TreeCursor<'a, T, ()>,
}

impl<T> Clone for TreeSetCursor<'_, T> {
    fn clone(&self) -> Self {
        TreeSetCursor {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Cursor for TreeSetCursor<'a, T> {
    type Item = &'a T;

    fn len(&self) -> usize {
        self.inner.len()
    }
    fn index(&self) -> usize {
        self.inner.index()
    }
    fn at_start(&self) -> bool {
        self.inner.at_start()
    }
    fn at_end(&self) -> bool {
        self.inner.at_end()
    }
    fn to_start(&mut self) -> bool {
        self.inner.to_start()
    }
    fn to_end(&mut self) -> bool {
        self.inner.to_end()
    }
    fn move_next(&mut self) -> bool {
        self.inner.move_next()
    }
    fn move_prev(&mut self) -> bool {
        self.inner.move_prev()
    }
    fn get(&self) -> Option<&'a T> {
        self.inner.key()
    }
}

impl<T> CursorSource for TreeSet<T> {
    type Cursor<'a> = TreeSetCursor<'a, T> where Self: 'a;

    fn cursor_start(&self) -> TreeSetCursor<'_, T> {
        TreeSetCursor {
            inner: self.map.cursor_start(),
        }
    }

    fn cursor_end(&self) -> TreeSetCursor<'_, T> {
        TreeSetCursor {
            inner: self.map.cursor_end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[i32]) -> TreeSet<i32> {
        items.iter().copied().collect()
    }

    #[test]
    fn insert_reports_duplicate() {
        let mut s = TreeSet::new();
        s.insert(4).unwrap();
        assert_eq!(s.insert(4), Err(InsertError::Duplicate));
        assert_eq!(s.len(), 1);
        assert_eq!(s.remove(&4), Some(4));
        assert_eq!(s.remove(&4), None);
        assert!(s.is_empty());
    }

    #[test]
    fn borrowed_lookup() {
        let s: TreeSet<String> = ["b", "a"].iter().map(|x| x.to_string()).collect();
        assert!(s.contains("a"));
        assert_eq!(s.get("b").map(String::as_str), Some("b"));
        assert_eq!(s.min().map(String::as_str), Some("a"));
        assert_eq!(s.max().map(String::as_str), Some("b"));
    }

    #[test]
    fn algebra_is_ordered() {
        let a = set(&[1, 2, 3, 4]);
        let b = set(&[3, 4, 5]);
        assert_eq!(a.union(&b), set(&[1, 2, 3, 4, 5]));
        assert_eq!(a.intersection(&b), set(&[3, 4]));
        assert_eq!(a.difference(&b), set(&[1, 2]));
        assert_eq!(a.symmetric_difference(&b), set(&[1, 2, 5]));
        assert_eq!(
            a.union(&b).iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn predicates() {
        let a = set(&[1, 2]);
        let b = set(&[1, 2, 3]);
        assert!(a.is_subset(&b) && a.is_proper_subset(&b));
        assert!(b.is_superset(&a) && b.is_proper_superset(&a));
        assert!(a.is_subset(&a) && !a.is_proper_subset(&a));
        assert!(a.is_disjoint(&set(&[7, 8])));
        assert!(!a.is_disjoint(&b));
        assert!(TreeSet::<i32>::new().is_subset(&a));
    }

    #[test]
    fn cursor_and_debug() {
        let s = set(&[30, 10, 20]);
        assert_eq!(format!("{s:?}"), "{10, 20, 30}");
        let mut c = s.cursor_end();
        assert_eq!(c.get(), Some(&30));
        assert!(c.move_prev());
        assert_eq!(c.get(), Some(&20));
        assert!(c.to_start());
        assert_eq!(c.get(), Some(&10));
        assert!(c.at_start());
    }
}
