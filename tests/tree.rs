// TreeMap / TreeSet integration suite (public API only).
//
// Properties exercised:
// - Iteration, min and max follow key order regardless of insert order.
// - Duplicate keys are rejected; updates replace values in place.
// - Cursors walk in key order and agree with iteration.
// - The ordered containers agree with the hash containers on content.
use primehash::{Cursor, CursorSource, HashSet, InsertError, TreeMap, TreeSet};
use std::collections::BTreeMap;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s >> 33)
    })
}

#[test]
fn random_inserts_and_removals_match_btreemap() {
    let mut m = TreeMap::new();
    let mut model = BTreeMap::new();
    for (i, x) in lcg(7).take(4000).enumerate() {
        let k = x % 1000;
        if i % 3 == 2 {
            assert_eq!(m.remove(&k), model.remove(&k));
        } else if model.contains_key(&k) {
            assert_eq!(m.insert(k, i), Err(InsertError::DuplicateKey));
        } else {
            model.insert(k, i);
            m.insert(k, i).unwrap();
        }
    }
    assert_eq!(m.len(), model.len());
    assert!(m.iter().eq(model.iter()));
    assert_eq!(m.min(), model.iter().next());
    assert_eq!(m.max(), model.iter().next_back());
}

#[test]
fn update_in_place() {
    let mut m = TreeMap::new();
    m.insert("b", 2).unwrap();
    m.insert("a", 1).unwrap();
    assert_eq!(m.update("a", 10), Some(1));
    assert_eq!(m.update("c", 3), None);
    assert_eq!(m.iter().collect::<Vec<_>>(), vec![(&"a", &10), (&"b", &2)]);
}

#[test]
fn tree_cursor_in_order() {
    let m: TreeMap<u32, u32> = lcg(3).take(100).map(|x| ((x % 500) as u32, 0)).collect();
    let mut c = m.cursor_start();
    let mut keys = Vec::new();
    loop {
        keys.push(*c.key().unwrap());
        if !c.move_next() {
            break;
        }
    }
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(keys.len(), m.len());
    assert!(c.go_to(0));
    assert_eq!(c.key(), m.min().map(|(k, _)| k));
}

#[test]
fn tree_set_agrees_with_hash_set() {
    let mut hs = HashSet::new(16, 0.75).unwrap();
    let mut ts = TreeSet::new();
    for x in lcg(11).take(2000) {
        let v = x % 700;
        assert_eq!(hs.insert(v).is_ok(), ts.insert(v).is_ok());
    }
    assert_eq!(hs.len(), ts.len());
    assert!(ts.iter().all(|v| hs.contains(v)));
    assert_eq!(hs.max(), ts.max());
    assert_eq!(hs.min(), ts.min());

    let evens: TreeSet<u64> = (0..700).step_by(2).collect();
    let odd_hits = ts.difference(&evens);
    assert!(odd_hits.iter().all(|v| v % 2 == 1));
    assert_eq!(
        odd_hits.len() + ts.intersection(&evens).len(),
        ts.len()
    );
    assert!(ts.union(&evens).is_superset(&evens));
}
