//! Debug-only reentrancy detection.
//!
//! Containers call user `Hash`, `Eq` and `Ord` implementations while a
//! probe or a rebalance is in flight. A user impl that reaches back into
//! the same container (through a raw pointer or a cell) would observe a
//! half-updated table. Each public operation holds a `BusyGuard` for its
//! duration; entering a second operation on the same container panics in
//! debug builds and names both operations. Release builds compile this to
//! nothing.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct Busy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Cell already makes this !Sync; keep it so in release builds too.
    _nosync: PhantomData<Cell<()>>,
}

impl Busy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosync: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> BusyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(running) = self.active.replace(Some(op)) {
                panic!("reentrant call to `{op}` while `{running}` is in progress");
            }
            BusyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            BusyGuard { _z: PhantomData }
        }
    }

    /// Panics if another operation is in progress. For entry points that
    /// run no user code themselves.
    #[inline]
    pub(crate) fn check(&self, op: &'static str) {
        drop(self.enter(op));
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn current(&self) -> Option<&'static str> {
        self.active.get()
    }
}

// Clones of a container start idle.
impl Clone for Busy {
    fn clone(&self) -> Self {
        Self::new()
    }
}

pub(crate) struct BusyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a Busy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::Busy;

    #[test]
    fn sequential_operations_are_fine() {
        let b = Busy::new();
        {
            let _g = b.enter("insert");
        }
        let _g = b.enter("remove");
        drop(_g);
        b.check("resize");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn guard_tracks_running_operation() {
        let b = Busy::new();
        assert_eq!(b.current(), None);
        {
            let _g = b.enter("contains");
            assert_eq!(b.current(), Some("contains"));
        }
        assert_eq!(b.current(), None);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_with_both_names() {
        let b = Busy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = b.enter("insert");
            let _inner = b.enter("contains");
        }));
        let err = res.expect_err("nested entry must panic in debug builds");
        let msg = err
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("insert") && msg.contains("contains"), "{msg}");
    }
}
