#![cfg(test)]

// Property tests for RunHashMap kept inside the crate so they can check the
// bucket directory against the record sequence after every operation.

use crate::run_hash_map::RunHashMap;
use crate::KeyNotFound;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    IndexOrDefault(usize, i32),
    Remove(usize),
    Find(usize),
    At(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
    CloneAndDiverge(usize),
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=48).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::IndexOrDefault(i, d)),
            4 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            1 => idx.clone().prop_map(OpI::At),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
            1 => idx.clone().prop_map(OpI::CloneAndDiverge),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S>(mut sut: RunHashMap<Key, i32, S>, pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let inserted = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert reports whether it created an entry");
                model.entry(k).or_insert(v);
            }
            OpI::IndexOrDefault(i, d) => {
                let k = key_from(pool, i);
                let slot = sut.get_or_insert_default(k.clone());
                *slot = slot.wrapping_add(d);
                let mv = model.entry(k).or_default();
                *mv = mv.wrapping_add(d);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                prop_assert!(sut.find(&k) == sut.cursor_end());
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(c.is_end(), !model.contains_key(&k));
                prop_assert_eq!(c.key_value(), model.get_key_value(&k));
            }
            OpI::At(i) => {
                let k = key_from(pool, i);
                let before = sut.len();
                match sut.at(&k) {
                    Ok(v) => prop_assert_eq!(Some(v), model.get(&k)),
                    Err(KeyNotFound) => prop_assert!(!model.contains_key(&k)),
                }
                prop_assert_eq!(sut.len(), before, "at never inserts");
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.saturating_add(d);
                    let mv = model.get_mut(&k).expect("present in model");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Iterate => {
                let mut count = 0;
                let mut s_keys = BTreeSet::new();
                for (k, v) in sut.iter() {
                    count += 1;
                    prop_assert!(s_keys.insert(k.clone()), "key repeated in iteration");
                    prop_assert_eq!(Some(v), model.get(k));
                }
                prop_assert_eq!(count, sut.len());
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), 0);
            }
            OpI::CloneAndDiverge(i) => {
                let k = key_from(pool, i);
                let mut copy = sut.clone();
                copy.assert_invariants();
                copy.remove(&k);
                copy.insert(Key("clone-only".to_string()), 0);
                prop_assert_eq!(sut.get(&k), model.get(&k), "source unaffected by its clone");
                prop_assert!(!sut.contains_key("clone-only"));
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }

    // Drain everything: the map must end up indistinguishable from a new one.
    let keys: Vec<Key> = model.keys().cloned().collect();
    for k in keys {
        prop_assert!(sut.remove(&k).is_some());
        sut.assert_invariants();
    }
    prop_assert!(sut.is_empty());
    prop_assert_eq!(sut.bucket_count(), 0);
    prop_assert!(sut.cursor_front() == sut.cursor_end());
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - First writer wins on insert; get_or_insert_default creates once.
// - Removal and lookup parity with the model; `at` never inserts.
// - Directory runs match the cached hashes of the records (checked after
//   every operation), counts sum to len, load stays in the hysteresis band.
// - Iteration yields each live entry exactly once.
// - Clones are deep; mutating one leaves the source alone.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(RunHashMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Weak hasher folding keys into very few distinct hashes, so several runs
// of length > 1 sit next to each other in the sequence.
#[derive(Clone, Default)]
struct FewHashesBuildHasher;
#[derive(Default)]
struct FewHashesHasher(u64);
impl BuildHasher for FewHashesBuildHasher {
    type Hasher = FewHashesHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FewHashesHasher::default()
    }
}
impl Hasher for FewHashesHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_add(u64::from(b));
        }
    }
    fn finish(&self) -> u64 {
        self.0 % 3
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every key shares one run.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(RunHashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_adjacent_runs((pool, ops) in arb_scenario()) {
        run_scenario(RunHashMap::with_hasher(FewHashesBuildHasher), &pool, ops)?;
    }
}
