#![cfg(test)]

// Property tests for ChainedTable kept inside the crate so they can call
// the structural invariant checker.

use crate::hash::{BucketHash, ByteHash, StrHash};
use crate::map::Visit;
use crate::table::ChainedTable;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// Pool-indexed operations: indices shrink to earlier keys, pool length
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Remove(usize),
    Get(usize),
    Bump(usize, i32),
    Iterate,
    // Remove every entry whose value is odd through the visitor.
    SweepOdd,
    // Visit at most n entries, then stop.
    VisitFirst(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-d]{0,3}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), -50i32..50).prop_map(|(i, v)| Op::Put(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => (idx.clone(), -5i32..5).prop_map(|(i, d)| Op::Bump(i, d)),
            1 => Just(Op::Iterate),
            1 => Just(Op::SweepOdd),
            1 => (0usize..6).prop_map(Op::VisitFirst),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Expected traversal: model entries in insertion order, stably sorted by
// bucket index.
fn expected_order<H: BucketHash<String>>(
    hasher: &H,
    order: u32,
    inserted: &[(String, i32)],
) -> Vec<(String, i32)> {
    let mut v = inserted.to_vec();
    v.sort_by_key(|(k, _)| hasher.bucket(k, order));
    v
}

fn run<H>(hasher: H, pool: Vec<String>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    H: BucketHash<String> + Clone + 'static,
{
    let destroyed = Rc::new(RefCell::new(Vec::new()));
    let sink = destroyed.clone();
    let mut sut: ChainedTable<String, i32, H> = ChainedTable::builder()
        .hasher(hasher.clone())
        .on_value_destroy(move |v| sink.borrow_mut().push(v))
        .build()
        .expect("default table builds");
    let order = sut.order();

    // Insertion-ordered model; replacement moves a key to the end.
    let mut model: Vec<(String, i32)> = Vec::new();
    let mut expect_destroyed: Vec<i32> = Vec::new();

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = pool[i].clone();
                if let Some(pos) = model.iter().position(|(mk, _)| *mk == k) {
                    let (_, old) = model.remove(pos);
                    expect_destroyed.push(old);
                }
                let before = sut.len();
                let fresh = !sut.contains_key(&k);
                sut.put(k.clone(), v).expect("no entry limit configured");
                prop_assert_eq!(sut.len(), before + usize::from(fresh));
                prop_assert_eq!(sut.get(&k), Some(&v));
                model.push((k, v));
            }
            Op::Remove(i) => {
                let k = &pool[i];
                let pos = model.iter().position(|(mk, _)| mk == k);
                let before = sut.len();
                let removed = sut.remove(k);
                prop_assert_eq!(removed, pos.is_some());
                if let Some(pos) = pos {
                    let (_, old) = model.remove(pos);
                    expect_destroyed.push(old);
                    prop_assert_eq!(sut.len(), before - 1);
                } else {
                    prop_assert_eq!(sut.len(), before);
                }
                prop_assert!(sut.get(k).is_none());
            }
            Op::Get(i) => {
                let k = &pool[i];
                let want = model.iter().find(|(mk, _)| mk == k).map(|(_, v)| v);
                prop_assert_eq!(sut.get(k), want);
            }
            Op::Bump(i, d) => {
                let k = &pool[i];
                if let Some(v) = sut.get_mut(k) {
                    *v += d;
                }
                if let Some((_, v)) = model.iter_mut().find(|(mk, _)| mk == k) {
                    *v += d;
                }
            }
            Op::Iterate => {
                let got: Vec<(String, i32)> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(got, expected_order(&hasher, order, &model));
            }
            Op::SweepOdd => {
                let expected = expected_order(&hasher, order, &model);
                let mut visited = Vec::new();
                sut.for_each(|k, v| {
                    visited.push((k.clone(), *v));
                    if *v % 2 != 0 {
                        Visit::Remove
                    } else {
                        Visit::Continue
                    }
                });
                prop_assert_eq!(&visited, &expected);
                for (_, v) in expected.iter().filter(|(_, v)| v % 2 != 0) {
                    expect_destroyed.push(*v);
                }
                model.retain(|(_, v)| v % 2 == 0);
            }
            Op::VisitFirst(n) => {
                let expected = expected_order(&hasher, order, &model);
                let mut visited = Vec::new();
                sut.for_each(|k, _| {
                    visited.push(k.clone());
                    if visited.len() > n {
                        Visit::Stop
                    } else {
                        Visit::Continue
                    }
                });
                let want: Vec<String> = expected
                    .into_iter()
                    .take(n + 1)
                    .map(|(k, _)| k)
                    .collect();
                prop_assert_eq!(visited, want);
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.iter().count(), sut.len());
        prop_assert_eq!(&*destroyed.borrow(), &expect_destroyed);
    }
    Ok(())
}

// Property: State-machine equivalence against an insertion-ordered model.
// Invariants exercised across random operation sequences:
// - `put` replaces equal keys, firing the value callback once for the old
//   value, and increments the count only for fresh keys.
// - `remove` reports presence and decrements the count exactly when found.
// - Traversal is bucket-major, insertion-minor, and visits each live entry
//   exactly once; the visitor can remove the current entry or stop early.
// - Chains stay structurally sound after every operation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(StrHash, pool, ops)?;
    }
}

// Same invariants with heavy collisions: only the first byte is hashed, so
// keys sharing a first letter share a chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(ByteHash, pool, ops)?;
    }
}

// Property: a fresh table's bucket count follows the size hint.
proptest! {
    #[test]
    fn prop_bucket_count(hint in 0usize..100_000) {
        let t: ChainedTable<usize, ()> = ChainedTable::builder().size_hint(hint).build().unwrap();
        prop_assert!(t.bucket_count().is_power_of_two());
        prop_assert!(t.bucket_count() >= 8);
        prop_assert!(t.bucket_count() >= hint);
        prop_assert!(t.bucket_count() == 8 || t.bucket_count() / 2 < hint);
    }
}

#[test]
fn model_map_agrees_after_bulk_load() {
    let mut sut: ChainedTable<String, usize, StrHash> =
        ChainedTable::builder().hasher(StrHash).size_hint(64).build().unwrap();
    let mut model = HashMap::new();
    for i in 0..1_000 {
        let k = format!("key{}", i % 300);
        sut.put(k.clone(), i).unwrap();
        model.insert(k, i);
    }
    sut.check_invariants();
    assert_eq!(sut.len(), model.len());
    for (k, v) in &model {
        assert_eq!(sut.get(k), Some(v));
    }
}
