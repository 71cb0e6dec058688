//! Bidirectional cursors over container contents.
//!
//! A cursor is positioned on one element at a time and tracks its ordinal
//! `index` among the live elements plus two sticky flags: `at_start` after
//! it tried to step before the first element (or was created there) and
//! `at_end` after it tried to step past the last one. Stepping off either
//! end does not move the cursor; it only raises the flag.
//!
//! Cursors hold a shared borrow of their container, so the container
//! cannot change while one is alive.

use crate::raw::RawTable;

pub trait Cursor {
    type Item;

    /// Number of elements the cursor walks over.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordinal position of the current element.
    fn index(&self) -> usize;

    fn at_start(&self) -> bool;

    fn at_end(&self) -> bool;

    /// Jump to the first element. `false` on an empty container.
    fn to_start(&mut self) -> bool;

    /// Jump to the last element and raise `at_end`. `false` on an empty
    /// container.
    fn to_end(&mut self) -> bool;

    fn move_next(&mut self) -> bool;

    fn move_prev(&mut self) -> bool;

    /// Element under the cursor, `None` on an empty container.
    fn get(&self) -> Option<Self::Item>;

    /// Step forward `steps` elements.
    ///
    /// Refuses, without moving, when `steps` is zero or would run past the
    /// last element. Called on the last element it raises `at_end`.
    fn advance(&mut self, steps: usize) -> bool {
        if self.at_end() {
            return false;
        }
        if self.index() + 1 == self.len() {
            self.move_next();
            return false;
        }
        if steps == 0 || self.index().saturating_add(steps) >= self.len() {
            return false;
        }
        for _ in 0..steps {
            self.move_next();
        }
        true
    }

    /// Step backward `steps` elements. Mirror image of `advance`.
    fn rewind(&mut self, steps: usize) -> bool {
        if self.at_start() {
            return false;
        }
        if self.index() == 0 {
            self.move_prev();
            return false;
        }
        if steps == 0 || self.index() < steps {
            return false;
        }
        for _ in 0..steps {
            self.move_prev();
        }
        true
    }

    /// Move to the element with ordinal `index`.
    fn go_to(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        let here = self.index();
        if here < index {
            for _ in here..index {
                self.move_next();
            }
        } else {
            for _ in index..here {
                self.move_prev();
            }
        }
        true
    }
}

/// Containers that hand out cursors positioned at either end.
pub trait CursorSource {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Cursor on the first element, with `at_start` raised.
    fn cursor_start(&self) -> Self::Cursor<'_>;

    /// Cursor on the last element, with `at_end` raised.
    fn cursor_end(&self) -> Self::Cursor<'_>;
}

/// Ordered positions a cursor can stand on.
pub(crate) trait Walk {
    type Pos: Copy;

    fn count(&self) -> usize;
    fn first_pos(&self) -> Option<Self::Pos>;
    fn last_pos(&self) -> Option<Self::Pos>;
    fn next_pos(&self, pos: Self::Pos) -> Option<Self::Pos>;
    fn prev_pos(&self, pos: Self::Pos) -> Option<Self::Pos>;
}

impl<T> Walk for RawTable<T> {
    type Pos = usize;

    fn count(&self) -> usize {
        self.len()
    }
    fn first_pos(&self) -> Option<usize> {
        self.first_filled()
    }
    fn last_pos(&self) -> Option<usize> {
        self.last_filled()
    }
    fn next_pos(&self, pos: usize) -> Option<usize> {
        self.next_filled(pos)
    }
    fn prev_pos(&self, pos: usize) -> Option<usize> {
        self.prev_filled(pos)
    }
}

/// Cursor state shared by every container.
///
/// The first and last positions are captured when the cursor is built.
pub(crate) struct Position<'a, W: Walk + ?Sized> {
    target: &'a W,
    pos: Option<W::Pos>,
    first: Option<W::Pos>,
    last: Option<W::Pos>,
    index: usize,
    start: bool,
    end: bool,
}

impl<W: Walk + ?Sized> Clone for Position<'_, W> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, W: Walk + ?Sized> Position<'a, W> {
    pub(crate) fn start(target: &'a W) -> Self {
        let first = target.first_pos();
        Self {
            target,
            pos: first,
            first,
            last: target.last_pos(),
            index: 0,
            start: true,
            end: target.count() == 0,
        }
    }

    pub(crate) fn end(target: &'a W) -> Self {
        let mut cur = Self::start(target);
        cur.to_end();
        cur.start = target.count() == 0;
        cur.end = true;
        cur
    }

    pub(crate) fn target(&self) -> &'a W {
        self.target
    }

    /// Current position, `None` on an empty container.
    pub(crate) fn pos(&self) -> Option<W::Pos> {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.target.count()
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn at_start(&self) -> bool {
        self.start
    }

    pub(crate) fn at_end(&self) -> bool {
        self.end
    }

    pub(crate) fn to_start(&mut self) -> bool {
        if self.target.count() == 0 {
            return false;
        }
        self.pos = self.first;
        self.index = 0;
        self.start = true;
        self.end = false;
        true
    }

    pub(crate) fn to_end(&mut self) -> bool {
        if self.target.count() == 0 {
            return false;
        }
        self.pos = self.last;
        self.index = self.target.count() - 1;
        self.start = false;
        self.end = true;
        true
    }

    pub(crate) fn move_next(&mut self) -> bool {
        if self.end {
            return false;
        }
        if self.index + 1 == self.target.count() {
            self.end = true;
            return false;
        }
        match self.pos.and_then(|p| self.target.next_pos(p)) {
            Some(next) => {
                self.pos = Some(next);
                self.index += 1;
                self.start = false;
                true
            }
            None => {
                self.end = true;
                false
            }
        }
    }

    pub(crate) fn move_prev(&mut self) -> bool {
        if self.start {
            return false;
        }
        if self.index == 0 {
            self.start = true;
            return false;
        }
        match self.pos.and_then(|p| self.target.prev_pos(p)) {
            Some(prev) => {
                self.pos = Some(prev);
                self.index -= 1;
                self.end = false;
                true
            }
            None => {
                self.start = true;
                false
            }
        }
    }
}

/// Forwards the positional `Cursor` methods to an inner `Position`.
macro_rules! forward_cursor {
    ($inner:tt) => {
        fn len(&self) -> usize {
            self.$inner.len()
        }
        fn index(&self) -> usize {
            self.$inner.index()
        }
        fn at_start(&self) -> bool {
            self.$inner.at_start()
        }
        fn at_end(&self) -> bool {
            self.$inner.at_end()
        }
        fn to_start(&mut self) -> bool {
            self.$inner.to_start()
        }
        fn to_end(&mut self) -> bool {
            self.$inner.to_end()
        }
        fn move_next(&mut self) -> bool {
            self.$inner.move_next()
        }
        fn move_prev(&mut self) -> bool {
            self.$inner.move_prev()
        }
    };
}
pub(crate) use forward_cursor;

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain<'a>(Position<'a, RawTable<u32>>);

    impl<'a> Cursor for Plain<'a> {
        type Item = &'a u32;
        forward_cursor!(0);
        fn get(&self) -> Option<&'a u32> {
            let table = self.0.target();
            self.0.pos().and_then(|i| table.get(i))
        }
    }

    fn table(values: &[u32]) -> RawTable<u32> {
        let mut t = RawTable::try_with_capacity(53).unwrap();
        for &v in values {
            t.insert(u64::from(v) * 7, v).unwrap();
        }
        t
    }

    fn walk(t: &RawTable<u32>) -> Vec<u32> {
        let mut c = Plain(Position::start(t));
        let mut out = Vec::new();
        if c.is_empty() {
            return out;
        }
        loop {
            out.push(*c.get().unwrap());
            if !c.move_next() {
                break;
            }
        }
        out
    }

    #[test]
    fn empty_cursor_is_at_both_ends() {
        let t = table(&[]);
        let mut c = Plain(Position::start(&t));
        assert!(c.at_start() && c.at_end());
        assert!(!c.move_next());
        assert!(!c.move_prev());
        assert_eq!(c.index(), 0);
        assert_eq!(c.get(), None);
        assert!(!c.to_start());
        assert!(!c.to_end());
        assert!(!c.go_to(0));

        let e = Plain(Position::end(&t));
        assert!(e.at_start() && e.at_end());
    }

    #[test]
    fn forward_walk_visits_slot_order() {
        let t = table(&[1, 2, 3, 4]);
        let expected: Vec<u32> = t.iter().copied().collect();
        assert_eq!(walk(&t), expected);
    }

    #[test]
    fn stepping_off_the_end_only_raises_flag() {
        let t = table(&[5, 6]);
        let mut c = Plain(Position::start(&t));
        assert!(c.at_start());
        assert!(c.move_next());
        assert!(!c.at_start());
        let last = *c.get().unwrap();
        assert!(!c.move_next());
        assert!(c.at_end());
        assert_eq!(c.index(), 1);
        assert_eq!(*c.get().unwrap(), last);
        // Backing up clears the end flag.
        assert!(c.move_prev());
        assert!(!c.at_end());
        assert!(!c.move_prev());
        assert!(c.at_start());
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn end_cursor_walks_backward() {
        let t = table(&[10, 20, 30]);
        let mut c = Plain(Position::end(&t));
        assert!(c.at_end());
        assert_eq!(c.index(), 2);
        let mut back = vec![*c.get().unwrap()];
        while c.move_prev() {
            back.push(*c.get().unwrap());
        }
        back.reverse();
        assert_eq!(back, walk(&t));
    }

    #[test]
    fn advance_and_rewind_bounds() {
        let t = table(&[1, 2, 3, 4, 5]);
        let mut c = Plain(Position::start(&t));
        assert!(!c.advance(0));
        assert!(!c.advance(5));
        assert!(c.advance(4));
        assert_eq!(c.index(), 4);
        // On the last element: raises at_end and refuses.
        assert!(!c.advance(1));
        assert!(c.at_end());
        assert!(!c.advance(1));

        assert!(!c.rewind(0));
        assert!(!c.rewind(5));
        assert!(c.rewind(3));
        assert_eq!(c.index(), 1);
        assert!(c.rewind(1));
        assert!(!c.rewind(1));
        assert!(c.at_start());
    }

    #[test]
    fn go_to_moves_both_ways() {
        let t = table(&[1, 2, 3, 4, 5]);
        let order = walk(&t);
        let mut c = Plain(Position::start(&t));
        assert!(c.go_to(3));
        assert_eq!(*c.get().unwrap(), order[3]);
        assert!(c.go_to(1));
        assert_eq!(*c.get().unwrap(), order[1]);
        assert!(!c.go_to(5));
        assert_eq!(c.index(), 1);
    }
}
