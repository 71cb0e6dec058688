#![cfg(test)]

// Property tests kept inside the crate so they can reach the layout
// checkers on the internal tables.

use crate::test_support::ConstBuildHasher;
use crate::{BidiMap, Cursor, CursorSource, HashSet, InsertError, MultiMap, TreeMap, UpdateError};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, HashMap, HashSet as StdSet, VecDeque};
use std::hash::BuildHasher;

// Small key space so duplicates, collisions and tombstone reuse are common.
fn key() -> impl Strategy<Value = u16> {
    0u16..48
}

#[derive(Clone, Debug)]
enum SetOp {
    Insert(u16),
    Remove(u16),
    Contains(u16),
    Resize(usize),
    Clear,
    Iterate,
}

fn set_ops() -> impl Strategy<Value = Vec<SetOp>> {
    let op = prop_oneof![
        4 => key().prop_map(SetOp::Insert),
        2 => key().prop_map(SetOp::Remove),
        2 => key().prop_map(SetOp::Contains),
        1 => (0usize..400).prop_map(SetOp::Resize),
        1 => Just(SetOp::Clear),
        1 => Just(SetOp::Iterate),
    ];
    proptest::collection::vec(op, 1..120)
}

fn run_set<S: BuildHasher>(mut sut: HashSet<u16, S>, ops: Vec<SetOp>) -> Result<(), TestCaseError> {
    let mut model: StdSet<u16> = StdSet::new();
    for op in ops {
        match op {
            SetOp::Insert(k) => {
                let res = sut.insert(k);
                if model.insert(k) {
                    prop_assert_eq!(res, Ok(()));
                } else {
                    prop_assert_eq!(res, Err(InsertError::Duplicate));
                }
            }
            SetOp::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.take(&k));
            }
            SetOp::Contains(k) => {
                prop_assert_eq!(sut.contains(&k), model.contains(&k));
            }
            SetOp::Resize(n) => {
                let before = sut.capacity();
                if sut.resize(n).is_err() {
                    prop_assert_eq!(sut.capacity(), before);
                }
            }
            SetOp::Clear => {
                sut.clear();
                model.clear();
            }
            SetOp::Iterate => {
                let seen: StdSet<u16> = sut.iter().copied().collect();
                prop_assert_eq!(seen.len(), sut.len());
                prop_assert_eq!(&seen, &model);
            }
        }
        prop_assert_eq!(sut.len(), model.len());
        sut.assert_layout();
    }
    let mut c = sut.cursor_start();
    let mut walked = 0;
    if !c.is_empty() {
        loop {
            prop_assert!(c.get().is_some_and(|k| model.contains(k)));
            walked += 1;
            if !c.move_next() {
                break;
            }
        }
    }
    prop_assert_eq!(walked, model.len());
    Ok(())
}

// Property: HashSet matches std::collections::HashSet across random
// insert/remove/resize/clear sequences.
// - Duplicate inserts fail with `Duplicate` and change nothing.
// - `len`, `contains` and iteration agree with the model after every op.
// - Capacity stays prime and `len <= capacity * load` holds throughout.
// - A refused resize keeps the capacity.
// - A cursor visits every element exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_hash_set_state_machine(ops in set_ops()) {
        run_set(HashSet::<u16, RandomState>::new(1, 0.75).unwrap(), ops)?;
    }

    #[test]
    fn prop_hash_set_const_hasher(ops in set_ops()) {
        run_set(HashSet::with_hasher(1, 0.75, ConstBuildHasher).unwrap(), ops)?;
    }
}

#[derive(Clone, Debug)]
enum MultiOp {
    Insert(u16, i32),
    Remove(u16),
    RemoveAll(u16),
    Update(u16, i32),
    GetAll(u16),
}

fn multi_ops() -> impl Strategy<Value = Vec<MultiOp>> {
    let k = || 0u16..12;
    let op = prop_oneof![
        5 => (k(), any::<i32>()).prop_map(|(k, v)| MultiOp::Insert(k, v)),
        2 => k().prop_map(MultiOp::Remove),
        1 => k().prop_map(MultiOp::RemoveAll),
        2 => (k(), any::<i32>()).prop_map(|(k, v)| MultiOp::Update(k, v)),
        2 => k().prop_map(MultiOp::GetAll),
    ];
    proptest::collection::vec(op, 1..150)
}

fn run_multi<S: BuildHasher>(
    mut sut: MultiMap<u16, i32, S>,
    ops: Vec<MultiOp>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u16, VecDeque<i32>> = HashMap::new();
    for op in ops {
        match op {
            MultiOp::Insert(k, v) => {
                prop_assert_eq!(sut.insert(k, v), Ok(()));
                model.entry(k).or_default().push_back(v);
            }
            MultiOp::Remove(k) => {
                let expect = model.get_mut(&k).and_then(|q| q.pop_front());
                prop_assert_eq!(sut.remove(&k), expect);
            }
            MultiOp::RemoveAll(k) => {
                let expect: Vec<i32> = model.remove(&k).map(Vec::from).unwrap_or_default();
                prop_assert_eq!(sut.remove_all(&k), expect);
            }
            MultiOp::Update(k, v) => {
                let expect = match model.get_mut(&k).and_then(|q| q.front_mut()) {
                    Some(slot) => Ok(std::mem::replace(slot, v)),
                    None => Err(UpdateError::NotFound),
                };
                prop_assert_eq!(sut.update(&k, v), expect);
            }
            MultiOp::GetAll(k) => {
                let got: Vec<i32> = sut.get_all(&k).copied().collect();
                let expect: Vec<i32> = model.get(&k).map(|q| q.iter().copied().collect()).unwrap_or_default();
                prop_assert_eq!(sut.key_count(&k), expect.len());
                prop_assert_eq!(sut.get(&k), expect.first());
                prop_assert_eq!(got, expect);
            }
        }
        model.retain(|_, q| !q.is_empty());
        let total: usize = model.values().map(VecDeque::len).sum();
        prop_assert_eq!(sut.len(), total);
        prop_assert_eq!(sut.iter().count(), total);
        prop_assert!(sut.len() as f64 <= sut.capacity() as f64 * sut.load());
    }
    Ok(())
}

// Property: MultiMap matches a map of FIFO queues.
// - Values under one key keep insertion order through growth.
// - `remove` takes the oldest value; `remove_all` drains in order.
// - `update` replaces only the oldest value and reports `NotFound`.
// - `len` equals the number of pairs and respects the load bound.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multimap_state_machine(ops in multi_ops()) {
        run_multi(MultiMap::<u16, i32, RandomState>::new(1, 0.75).unwrap(), ops)?;
    }

    #[test]
    fn prop_multimap_const_hasher(ops in multi_ops()) {
        run_multi(MultiMap::with_hasher(1, 2.0, ConstBuildHasher).unwrap(), ops)?;
    }
}

#[derive(Clone, Debug)]
enum BidiOp {
    Insert(u16, u16),
    RemoveByKey(u16),
    RemoveByVal(u16),
    UpdateKey(u16, u16),
    UpdateVal(u16, u16),
}

fn bidi_ops() -> impl Strategy<Value = Vec<BidiOp>> {
    let op = prop_oneof![
        4 => (key(), key()).prop_map(|(k, v)| BidiOp::Insert(k, v)),
        1 => key().prop_map(BidiOp::RemoveByKey),
        1 => key().prop_map(BidiOp::RemoveByVal),
        1 => (key(), key()).prop_map(|(v, k)| BidiOp::UpdateKey(v, k)),
        1 => (key(), key()).prop_map(|(k, v)| BidiOp::UpdateVal(k, v)),
    ];
    proptest::collection::vec(op, 1..150)
}

fn run_bidi<S: BuildHasher>(
    mut sut: BidiMap<u16, u16, S>,
    ops: Vec<BidiOp>,
) -> Result<(), TestCaseError> {
    let mut fwd: HashMap<u16, u16> = HashMap::new();
    let mut back: HashMap<u16, u16> = HashMap::new();
    for op in ops {
        match op {
            BidiOp::Insert(k, v) => {
                let expect = if fwd.contains_key(&k) {
                    Err(InsertError::DuplicateKey)
                } else if back.contains_key(&v) {
                    Err(InsertError::DuplicateValue)
                } else {
                    fwd.insert(k, v);
                    back.insert(v, k);
                    Ok(())
                };
                prop_assert_eq!(sut.insert(k, v), expect);
            }
            BidiOp::RemoveByKey(k) => {
                let expect = fwd.remove(&k).map(|v| {
                    back.remove(&v);
                    (k, v)
                });
                prop_assert_eq!(sut.remove_by_key(&k), expect);
            }
            BidiOp::RemoveByVal(v) => {
                let expect = back.remove(&v).map(|k| {
                    fwd.remove(&k);
                    (k, v)
                });
                prop_assert_eq!(sut.remove_by_val(&v), expect);
            }
            BidiOp::UpdateKey(v, nk) => {
                let expect = match back.get(&v).copied() {
                    None => Err(UpdateError::NotFound),
                    Some(old) if old == nk => Ok(nk),
                    Some(_) if fwd.contains_key(&nk) => Err(UpdateError::DuplicateKey),
                    Some(old) => {
                        fwd.remove(&old);
                        fwd.insert(nk, v);
                        back.insert(v, nk);
                        Ok(old)
                    }
                };
                prop_assert_eq!(sut.update_key(&v, nk), expect);
            }
            BidiOp::UpdateVal(k, nv) => {
                let expect = match fwd.get(&k).copied() {
                    None => Err(UpdateError::NotFound),
                    Some(old) if old == nv => Ok(nv),
                    Some(_) if back.contains_key(&nv) => Err(UpdateError::DuplicateValue),
                    Some(old) => {
                        back.remove(&old);
                        back.insert(nv, k);
                        fwd.insert(k, nv);
                        Ok(old)
                    }
                };
                prop_assert_eq!(sut.update_val(&k, nv), expect);
            }
        }
        prop_assert_eq!(sut.len(), fwd.len());
        for (k, v) in sut.iter() {
            prop_assert_eq!(fwd.get(k), Some(v));
            prop_assert_eq!(sut.get_key(v), Some(k));
        }
    }
    Ok(())
}

// Property: BidiMap stays a bijection matching a pair of std maps.
// - Insert rejects an existing key first, then an existing value.
// - Removal from either side drops the whole pair.
// - Updates keep the partner side and refuse to break uniqueness.
// - Every iterated pair resolves in both directions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_bidimap_state_machine(ops in bidi_ops()) {
        run_bidi(BidiMap::<u16, u16, RandomState>::new(1, 0.75).unwrap(), ops)?;
    }

    #[test]
    fn prop_bidimap_const_hasher(ops in bidi_ops()) {
        run_bidi(BidiMap::with_hasher(1, 0.75, ConstBuildHasher).unwrap(), ops)?;
    }
}

#[derive(Clone, Debug)]
enum TreeOp {
    Insert(u16, u32),
    Remove(u16),
    Update(u16, u32),
}

// Property: TreeMap matches BTreeMap and stays AVL-balanced.
// - Ordered iteration, min and max agree with the model.
// - Every insert and removal leaves heights, parent links and balance
//   factors consistent.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_tree_map_state_machine(ops in proptest::collection::vec(prop_oneof![
        3 => (key(), any::<u32>()).prop_map(|(k, v)| TreeOp::Insert(k, v)),
        2 => key().prop_map(TreeOp::Remove),
        1 => (key(), any::<u32>()).prop_map(|(k, v)| TreeOp::Update(k, v)),
    ], 1..200)) {
        let mut sut: TreeMap<u16, u32> = TreeMap::new();
        let mut model: BTreeMap<u16, u32> = BTreeMap::new();
        for op in ops {
            match op {
                TreeOp::Insert(k, v) => {
                    let res = sut.insert(k, v);
                    if model.contains_key(&k) {
                        prop_assert_eq!(res, Err(InsertError::DuplicateKey));
                    } else {
                        model.insert(k, v);
                        prop_assert_eq!(res, Ok(()));
                    }
                }
                TreeOp::Remove(k) => prop_assert_eq!(sut.remove(&k), model.remove(&k)),
                TreeOp::Update(k, v) => {
                    let expect = model.get_mut(&k).map(|slot| std::mem::replace(slot, v));
                    prop_assert_eq!(sut.update(&k, v), expect);
                }
            }
            sut.assert_avl();
            prop_assert!(sut.iter().eq(model.iter()));
            prop_assert_eq!(sut.min(), model.iter().next());
            prop_assert_eq!(sut.max(), model.iter().next_back());
        }
        let mut c = sut.cursor_end();
        let mut back = Vec::new();
        if !c.is_empty() {
            loop {
                back.extend(c.key().copied());
                if !c.move_prev() {
                    break;
                }
            }
        }
        prop_assert!(back.into_iter().eq(model.keys().rev().copied()));
    }
}
