// HashSet integration suite (public API only).
//
// Properties exercised:
// - Sizing: capacities come from the prime table and only grow.
// - Load bound: `len <= capacity * load` after every successful insert.
// - Uniqueness: a duplicate insert fails without changing the set.
// - Removal leaves the remaining elements reachable.
// - Set algebra and predicates match std::collections::HashSet.
// - Cursors visit every element exactly once in either direction.
use primehash::{
    next_prime, ConfigError, Cursor, CursorSource, GrowthPolicy, HashSet, InsertError,
    ResizeError, TableConfig, PRIMES,
};
use std::collections::HashSet as StdSet;

fn set_of(items: impl IntoIterator<Item = u32>) -> HashSet<u32> {
    let mut s = HashSet::new(8, 0.75).expect("valid config");
    s.extend(items);
    s
}

// Test: construction picks the smallest prime that covers capacity / load.
#[test]
fn construction_uses_prime_capacity() {
    assert_eq!(HashSet::<u8>::new(1, 0.99).unwrap().capacity(), 53);
    assert_eq!(HashSet::<u8>::new(100, 0.5).unwrap().capacity(), 383);
    assert_eq!(next_prime(200), 383);
    assert_eq!(
        HashSet::<u8>::new(0, 0.5).unwrap_err(),
        ConfigError::ZeroCapacity
    );
    assert!(matches!(
        HashSet::<u8>::new(10, 1.0),
        Err(ConfigError::InvalidLoad(_))
    ));
    assert!(matches!(
        HashSet::<u8>::new(10, f64::NAN),
        Err(ConfigError::InvalidLoad(_))
    ));
}

// Test: growth under sustained inserts.
// Verifies: capacity is always a table prime, never shrinks, and the load
// bound holds after each insert.
#[test]
fn growth_keeps_load_bound() {
    let mut s = HashSet::new(1, 0.5).unwrap();
    let mut last = s.capacity();
    for i in 0..20_000u64 {
        s.insert(i).unwrap();
        let cap = s.capacity();
        assert!(PRIMES.contains(&(cap as u64)));
        assert!(cap >= last);
        assert!(s.len() as f64 <= cap as f64 * 0.5);
        last = cap;
    }
    assert!((0..20_000u64).all(|i| s.contains(&i)));
}

#[test]
fn factor_growth_policy() {
    let cfg = TableConfig::new(20)
        .load(0.5)
        .growth(GrowthPolicy::Factor(2.0));
    let mut s = HashSet::with_config(cfg).unwrap();
    assert_eq!(s.growth(), GrowthPolicy::Factor(2.0));
    for i in 0..1000u32 {
        s.insert(i).unwrap();
    }
    assert!(s.len() as f64 <= s.capacity() as f64 * s.load());
}

#[test]
fn duplicates_and_removal() {
    let mut s: HashSet<String> = HashSet::new(4, 0.75).unwrap();
    s.insert("a".into()).unwrap();
    s.insert("b".into()).unwrap();
    assert_eq!(s.insert("a".into()), Err(InsertError::Duplicate));
    assert_eq!(s.len(), 2);
    assert_eq!(s.remove("a").as_deref(), Some("a"));
    assert_eq!(s.remove("a"), None);
    assert!(s.contains("b"));
    assert_eq!(s.get("b").map(String::as_str), Some("b"));
}

// Test: explicit resize rules.
// Verifies: no-op when the table is already big enough, TooSmall when the
// target cannot hold the elements, Overflow past the last prime.
#[test]
fn resize_rules() {
    let mut s = set_of(0..10);
    let cap = s.capacity();
    s.resize(5).unwrap();
    assert_eq!(s.capacity(), cap);
    s.resize(1000).unwrap();
    assert_eq!(s.capacity(), 1531);
    assert!((0..10).all(|i| s.contains(&i)));
    assert!(matches!(
        s.resize(usize::MAX),
        Err(ResizeError::Overflow { .. })
    ));

    let mut tight = HashSet::new(90, 0.25).unwrap();
    for i in 0..90u32 {
        tight.insert(i).unwrap();
    }
    let before = tight.capacity();
    assert_eq!(
        tight.resize(100),
        Err(ResizeError::TooSmall {
            requested: 100,
            count: 90
        })
    );
    assert_eq!(tight.capacity(), before);
}

#[test]
fn algebra_matches_std() {
    let a = set_of(0..40);
    let b = set_of(20..70);
    let sa: StdSet<u32> = (0..40).collect();
    let sb: StdSet<u32> = (20..70).collect();

    let collect = |s: &HashSet<u32>| s.iter().copied().collect::<StdSet<u32>>();
    assert_eq!(collect(&a.union(&b).unwrap()), &sa | &sb);
    assert_eq!(collect(&a.intersection(&b).unwrap()), &sa & &sb);
    assert_eq!(collect(&a.difference(&b).unwrap()), &sa - &sb);
    assert_eq!(collect(&a.symmetric_difference(&b).unwrap()), &sa ^ &sb);

    assert!(set_of(0..5).is_subset(&a));
    assert!(set_of(0..5).is_proper_subset(&a));
    assert!(a.is_superset(&set_of(10..20)));
    assert!(!a.is_proper_superset(&a));
    assert!(a.is_disjoint(&set_of(100..110)));
    assert!(!a.is_disjoint(&b));
}

#[test]
fn equality_across_capacities() {
    let a = set_of(0..30);
    let mut b = HashSet::new(500, 0.3).unwrap();
    for i in (0..30).rev() {
        b.insert(i).unwrap();
    }
    assert_ne!(a.capacity(), b.capacity());
    assert_eq!(a, b);
    b.remove(&3);
    assert_ne!(a, b);
}

#[test]
fn cursor_round_trip() {
    let s = set_of(0..25);
    let mut fwd = Vec::new();
    let mut c = s.cursor_start();
    loop {
        fwd.push(*c.get().unwrap());
        if !c.move_next() {
            break;
        }
    }
    assert!(c.at_end());
    let mut back = Vec::new();
    let mut c = s.cursor_end();
    loop {
        back.push(*c.get().unwrap());
        if !c.move_prev() {
            break;
        }
    }
    back.reverse();
    assert_eq!(fwd, back);
    assert_eq!(fwd.iter().copied().collect::<StdSet<u32>>().len(), 25);
    assert_eq!(fwd, s.iter().copied().collect::<Vec<_>>());
}

#[test]
fn clear_with_hands_back_everything() {
    let mut s = set_of(0..12);
    let cap = s.capacity();
    let mut out = Vec::new();
    s.clear_with(|v| out.push(v));
    out.sort_unstable();
    assert_eq!(out, (0..12).collect::<Vec<_>>());
    assert!(s.is_empty());
    assert_eq!(s.capacity(), cap);
    assert_eq!(s.max(), None);
}
