#![cfg(test)]

// Calling back into a container from user code it is running (here the
// `copy_with` closures) trips the debug reentrancy guard. Release builds
// compile the guard out.

use primehash::{BidiMap, HashSet, MultiMap};

fn set() -> HashSet<u32> {
    let mut s = HashSet::new(4, 0.75).unwrap();
    s.extend(0..4);
    s
}

#[test]
fn sequential_calls_are_ok() {
    let s = set();
    let copy = s.copy_with(|v| *v).unwrap();
    assert!(copy.contains(&3));
    assert!(s.contains(&3));
}

#[cfg(debug_assertions)]
#[test]
fn hash_set_reentry_panics_in_debug() {
    let s = set();
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = s.copy_with(|v| {
            let _ = s.contains(v);
            *v
        });
    }));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");
}

#[cfg(debug_assertions)]
#[test]
fn multimap_reentry_panics_in_debug() {
    let mut m = MultiMap::new(4, 0.75).unwrap();
    m.insert(1u8, 'a').unwrap();
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = m.copy_with(|k| *k, |v| {
            let _ = m.len();
            let _ = m.get(&1);
            *v
        });
    }));
    assert!(res.is_err());
}

#[cfg(debug_assertions)]
#[test]
fn bidimap_reentry_panics_in_debug() {
    let mut m = BidiMap::new(4, 0.75).unwrap();
    m.insert(1u8, 'a').unwrap();
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = m.copy_with(|k| *k, |v| {
            let _ = m.contains_val(v);
            *v
        });
    }));
    assert!(res.is_err());
}

#[cfg(not(debug_assertions))]
#[test]
fn reentry_is_unchecked_in_release() {
    let s = set();
    let copy = s
        .copy_with(|v| {
            assert!(s.contains(v));
            *v
        })
        .unwrap();
    assert_eq!(copy, s);
}
