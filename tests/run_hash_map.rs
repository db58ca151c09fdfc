// RunHashMap unit test suite (public API).
//
// Each test documents what behavior is being verified. The core
// invariants exercised:
// - Size: len equals the number of distinct keys inserted.
// - First writer wins: inserting a present key never changes its value.
// - Lookup/erase parity: present keys are found; erased keys are not.
// - Index access: get_or_insert_default inserts a default and writes through.
// - Read-only access: at() fails with KeyNotFound and never mutates.
// - Deep copy: clones never share entries with their source.
// - Iteration: begin..end visits len() entries, each exactly once.
// - Round trip: growing then erasing everything leaves a fresh-looking map.
use run_hashmap::{KeyNotFound, RunHashMap};
use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::hash::BuildHasher;

// Test: distinct inserts are all counted.
// Verifies: len() == number of distinct keys, including across several grows.
#[test]
fn size_counts_distinct_keys() {
    let mut m = RunHashMap::new();
    for i in 0..1_000u32 {
        assert!(m.insert(i, i * 3));
    }
    assert_eq!(m.len(), 1_000);
    for i in 0..1_000u32 {
        assert!(!m.insert(i % 10, 0));
    }
    assert_eq!(m.len(), 1_000);
    assert!(!m.is_empty());
}

// Test: lookup after insert, absence after erase.
// Verifies: find/get resolve inserted values; erase turns them into misses.
#[test]
fn find_then_erase() {
    let mut m: RunHashMap<String, String> = RunHashMap::new();
    for i in 0..100 {
        m.insert(format!("k{i}"), format!("v{i}"));
    }
    for i in 0..100 {
        let k = format!("k{i}");
        assert_eq!(m.find(&k).value(), Some(&format!("v{i}")));
        assert_eq!(m.get(k.as_str()).map(String::as_str), Some(format!("v{i}").as_str()));
    }
    for i in (0..100).filter(|i| i % 2 == 0) {
        assert_eq!(m.remove(format!("k{i}").as_str()), Some(format!("v{i}")));
    }
    for i in 0..100 {
        let k = format!("k{i}");
        assert_eq!(m.find(&k) == m.cursor_end(), i % 2 == 0);
    }
    assert_eq!(m.len(), 50);
}

// Test: erasing an absent key, or anything from an empty map, is a no-op.
#[test]
fn erase_missing_is_noop() {
    let mut m: RunHashMap<i32, i32> = RunHashMap::new();
    assert_eq!(m.remove(&1), None);
    m.insert(1, 1);
    assert_eq!(m.remove(&2), None);
    assert_eq!(m.len(), 1);
    assert_eq!(m.remove_entry(&1), Some((1, 1)));
    assert_eq!(m.remove(&1), None);
}

// Test: first-writer-wins round trip from the docs.
#[test]
fn insert_existing_keeps_value() {
    let mut m = RunHashMap::new();
    m.insert(1, "a");
    m.insert(1, "b");
    assert_eq!(m.find(&1).value(), Some(&"a"));
    assert_eq!(m.len(), 1);
}

// Test: index access inserts a default value and returns a live reference.
// Verifies: a write through the reference is visible through find().
#[test]
fn index_access_inserts_default() {
    let mut m: RunHashMap<&str, String> = RunHashMap::new();
    {
        let v = m.get_or_insert_default("k");
        assert!(v.is_empty());
        v.push_str("written");
    }
    assert_eq!(m.find("k").value().map(String::as_str), Some("written"));
    m.get_or_insert_default("k").push('!');
    assert_eq!(m["k"], "written!");
    assert_eq!(m.len(), 1);
}

// Test: read-only access on an absent key.
// Verifies: KeyNotFound is returned and the map is untouched.
#[test]
fn at_missing_key_fails_without_mutation() {
    let mut m: RunHashMap<i32, i32> = RunHashMap::new();
    m.insert(7, 70);
    let buckets = m.bucket_count();
    assert_eq!(m.at(&8), Err(KeyNotFound));
    assert_eq!(m.len(), 1);
    assert_eq!(m.bucket_count(), buckets);
    assert_eq!(m.at(&7), Ok(&70));

    let err: Box<dyn std::error::Error> = Box::new(KeyNotFound);
    assert_eq!(err.to_string(), "key not found");
}

// Test: copying then mutating the copy leaves the original intact.
#[test]
fn copy_is_independent() {
    let a = RunHashMap::from([(1, "x".to_string()), (2, "y".to_string())]);
    let mut b = a.clone();
    b.remove(&1);
    assert_eq!(a.len(), 2);
    assert_eq!(b.len(), 1);

    b.get_mut(&2).unwrap().push('y');
    assert_eq!(a[&2], "y");
    assert_eq!(b[&2], "yy");
}

// Test: copy assignment replaces the destination's previous contents.
#[test]
fn clone_from_replaces_contents() {
    let src = RunHashMap::from([(1, 10), (2, 20)]);
    let mut dst = RunHashMap::from([(3, 30), (4, 40), (5, 50)]);
    dst.clone_from(&src);
    assert_eq!(dst, src);
    assert!(!dst.contains_key(&3));
}

// Test: full traversal from begin to end.
// Verifies: exactly len() entries, no key repeated, matching iter().
#[test]
fn iteration_visits_each_entry_once() {
    let m: RunHashMap<u64, u64> = (0..500).map(|i| (i * 7, i)).collect();
    let mut seen = HashSet::new();
    let mut c = m.cursor_front();
    let end = m.cursor_end();
    let mut steps = 0;
    while c != end {
        assert!(seen.insert(*c.key().unwrap()));
        c.move_next();
        steps += 1;
    }
    assert_eq!(steps, m.len());
    let via_iter: Vec<u64> = m.iter().map(|(k, _)| *k).collect();
    let via_keys: Vec<u64> = m.keys().copied().collect();
    assert_eq!(via_iter, via_keys);
    assert_eq!(via_iter.len(), seen.len());
    // Restartable: a second pass sees the same order.
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), via_keys);
}

// Test: growing to N and erasing all N returns to an empty, valid map.
#[test]
fn grow_then_erase_all_is_fresh() {
    let mut m: RunHashMap<u32, u32> = RunHashMap::new();
    for i in 0..300 {
        m.insert(i, i);
    }
    for i in 0..300 {
        assert_eq!(m.remove(&i), Some(i));
    }
    let fresh: RunHashMap<u32, u32> = RunHashMap::new();
    assert!(m.is_empty());
    assert_eq!(m.len(), fresh.len());
    assert_eq!(m.bucket_count(), fresh.bucket_count());
    assert_eq!(m.iter().count(), 0);
    assert!(m.find(&1).is_end());
    assert_eq!(m, fresh);

    // And it keeps working.
    m.insert(5, 6);
    assert_eq!(m.get(&5), Some(&6));
}

// Test: clear keeps the hasher and leaves a usable map.
#[test]
fn clear_keeps_hasher() {
    let hasher = RandomState::new();
    let probe = hasher.hash_one("probe");
    let mut m: RunHashMap<&str, i32, RandomState> = RunHashMap::with_hasher(hasher);
    m.insert("a", 1);
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.bucket_count(), 0);
    assert_eq!(m.hasher().hash_one("probe"), probe);
    m.insert("b", 2);
    assert_eq!(m.at("b"), Ok(&2));
}

// Test: construction from a literal list and from an iterator agree.
#[test]
fn literal_and_iterator_construction() {
    let lit = RunHashMap::from([("a", 1), ("b", 2), ("a", 3)]);
    let it: RunHashMap<&str, i32> = vec![("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
    assert_eq!(lit.len(), 2);
    assert_eq!(lit, it);
    assert_eq!(lit["a"], 1);

    let mut ext = RunHashMap::new();
    ext.extend([("b", 2), ("a", 1)]);
    assert_eq!(ext, lit);
}

// Test: owning and mutable iteration.
#[test]
fn owned_and_mutable_iteration() {
    let mut m: RunHashMap<i32, i32> = (1..=5).map(|i| (i, i)).collect();
    for (_, v) in &mut m {
        *v *= 10;
    }
    let total: i32 = (&m).into_iter().map(|(_, v)| *v).sum();
    assert_eq!(total, 150);
    let mut pairs: Vec<(i32, i32)> = m.into_iter().collect();
    pairs.sort_unstable();
    assert_eq!(pairs, vec![(1, 10), (2, 20), (3, 30), (4, 40), (5, 50)]);
}

// Test: pre-sized map does not rebuild until it passes its reservation.
#[test]
fn with_capacity_presizes_directory() {
    let mut m: RunHashMap<u32, ()> = RunHashMap::with_capacity(10);
    let buckets = m.bucket_count();
    assert!(buckets > 0);
    for i in 0..10 {
        m.insert(i, ());
    }
    assert_eq!(m.bucket_count(), buckets);
}

// Test: Debug renders as a map.
#[test]
fn debug_format() {
    let m = RunHashMap::from([(1, "one")]);
    assert_eq!(format!("{m:?}"), r#"{1: "one"}"#);
}
