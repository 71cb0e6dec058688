//! primehash: hash containers over prime-sized tables, plus an ordered
//! AVL map and set with the same cursor interface.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small family of containers that share their sizing rules,
//!   their error vocabulary and one bidirectional cursor protocol.
//! - Layers:
//!   - `primes`/`config`: the prime capacity table, the load-factor
//!     arithmetic and the validated `TableConfig` every hash container
//!     is built from.
//!   - `RawTable<T>`: open-addressing slot array with Robin Hood
//!     displacement and tombstone deletion. Slots cache each element's
//!     `u64` hash.
//!   - `HashSet<T, S>`: unique elements in one `RawTable`.
//!   - `BidiMap<K, V, S>`: two `RawTable`s (one indexed by key hash, one
//!     by value hash) pointing into a shared entry arena.
//!   - `MultiMap<K, V, S>`: separate chaining. Nodes live in a `SlotMap`
//!     arena and form one doubly linked chain per bucket; equal keys keep
//!     insertion order.
//!   - `TreeMap<K, V>`/`TreeSet<T>`: AVL tree in a `SlotMap` arena with
//!     parent links, used as the ordered reference container.
//!   - `cursor`: one position state machine driven by each container's
//!     walk order.
//!
//! Constraints
//! - Capacities of hash containers are always taken from the prime table.
//! - After every successful insert `len <= capacity * load`. Growth is
//!   decided before the element is placed.
//! - A failed insert, resize or update leaves the container unchanged.
//! - Hashes are computed once per element; resizing and tombstone purges
//!   use the cached value and never call `Hash` or `Eq`.
//!
//! Reentrancy policy
//! - Each container carries a debug-only guard entered while user code
//!   (`Hash`, `Eq`, `Ord`, closures passed to `clear_with`/`copy_with`)
//!   may run. Calling back into the same container from that code panics
//!   in debug builds. Structural mutation happens after the guard is
//!   released and runs no user code.
//!
//! Notes and non-goals
//! - Single-threaded containers; no internal locking.
//! - Cursors borrow their container, so the container cannot change while
//!   one is alive.
//! - Allocation failures surface as errors where the standard library
//!   offers a fallible path (`try_reserve`); arena growth still aborts on
//!   OOM as `Vec` does.

mod bidimap;
mod config;
mod cursor;
mod error;
mod guard;
mod hash_set;
mod multimap;
mod primes;
mod proptests;
mod raw;
#[cfg(test)]
mod test_support;
mod tree_map;
mod tree_set;

// Public surface
pub use bidimap::{BidiCursor, BidiMap, Iter as BidiIter};
pub use config::{GrowthPolicy, TableConfig};
pub use cursor::{Cursor, CursorSource};
pub use error::{ConfigError, InsertError, ResizeError, UpdateError};
pub use hash_set::{HashSet, IntoIter as SetIntoIter, Iter as SetIter, SetCursor};
pub use multimap::{GetAll, Iter as MultiMapIter, MultiMap, MultiMapCursor};
pub use primes::{next_prime, table_capacity, PRIMES};
pub use tree_map::{Iter as TreeIter, TreeCursor, TreeMap};
pub use tree_set::{TreeSet, TreeSetCursor};
