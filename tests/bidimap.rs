// BidiMap integration suite (public API only).
//
// Properties exercised:
// - Every pair resolves from both sides; keys and values are each unique.
// - Rejected inserts and updates leave the map unchanged.
// - Removal from either side drops the whole pair.
// - Growth and churn never lose a pair.
use primehash::{BidiMap, Cursor, CursorSource, InsertError, UpdateError};

fn numbers() -> BidiMap<String, u32> {
    let mut m = BidiMap::new(4, 0.75).unwrap();
    for (name, n) in [("one", 1), ("two", 2), ("three", 3)] {
        m.insert(name.to_string(), n).unwrap();
    }
    m
}

#[test]
fn both_directions() {
    let m = numbers();
    assert_eq!(m.get_val("two"), Some(&2));
    assert_eq!(m.get_key(&3).map(String::as_str), Some("three"));
    assert_eq!(m.get_val("four"), None);
    assert_eq!(m.get_key(&4), None);
}

#[test]
fn uniqueness_on_both_sides() {
    let mut m = numbers();
    assert_eq!(m.insert("one".into(), 9), Err(InsertError::DuplicateKey));
    assert_eq!(m.insert("nine".into(), 1), Err(InsertError::DuplicateValue));
    assert_eq!(m.len(), 3);
    assert!(!m.contains_val(&9));
    assert!(!m.contains_key("nine"));
}

#[test]
fn updates_keep_partner() {
    let mut m = numbers();
    assert_eq!(m.update_key(&1, "uno".into()).as_deref(), Ok("one"));
    assert_eq!(m.get_val("uno"), Some(&1));
    assert!(!m.contains_key("one"));

    assert_eq!(m.update_val("two", 22), Ok(2));
    assert_eq!(m.get_key(&22).map(String::as_str), Some("two"));
    assert!(!m.contains_val(&2));

    assert_eq!(m.update_val("two", 3), Err(UpdateError::DuplicateValue));
    assert_eq!(
        m.update_key(&3, "uno".into()),
        Err(UpdateError::DuplicateKey)
    );
    assert_eq!(m.update_key(&99, "x".into()), Err(UpdateError::NotFound));
    assert_eq!(m.update_val("three", 3), Ok(3));
    assert_eq!(m.len(), 3);
}

#[test]
fn remove_from_either_side() {
    let mut m = numbers();
    assert_eq!(m.remove_by_key("one"), Some(("one".to_string(), 1)));
    assert_eq!(m.remove_by_val(&2), Some(("two".to_string(), 2)));
    assert_eq!(m.remove_by_val(&2), None);
    assert_eq!(m.len(), 1);
    assert!(!m.contains_val(&1));
    assert!(!m.contains_key("two"));
}

#[test]
fn growth_and_churn() {
    let mut m = BidiMap::new(1, 0.8).unwrap();
    for i in 0..5000u32 {
        m.insert(i, u64::from(i) * 3).unwrap();
    }
    for i in (0..5000u32).step_by(2) {
        assert_eq!(m.remove_by_key(&i), Some((i, u64::from(i) * 3)));
    }
    for i in 0..2500u32 {
        m.insert(10_000 + i, 1 + u64::from(i) * 6).unwrap();
    }
    assert_eq!(m.len(), 5000);
    assert!(m.len() as f64 <= m.capacity() as f64 * m.load());
    for (k, v) in m.iter() {
        assert_eq!(m.get_key(v), Some(k));
        assert_eq!(m.get_val(k), Some(v));
    }
}

#[test]
fn equality_ignores_layout() {
    let a = numbers();
    let mut b = BidiMap::new(100, 0.5).unwrap();
    for (name, n) in [("three", 3), ("one", 1), ("two", 2)] {
        b.insert(name.to_string(), n).unwrap();
    }
    assert_eq!(a, b);
    b.update_val("one", 11).unwrap();
    assert_ne!(a, b);
}

#[test]
fn cursor_walks_every_pair() {
    let m = numbers();
    let mut c = m.cursor_end();
    let mut seen = Vec::new();
    loop {
        seen.push(*c.value().unwrap());
        if !c.move_prev() {
            break;
        }
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3]);
    assert!(c.at_start());
}
