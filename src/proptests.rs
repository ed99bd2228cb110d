use std::collections::BTreeSet;

use proptest::prelude::*;

use super::*;
use crate::probe_table::FREE_KEY;

fn validate_set(s: &UintSet) {
    let slots = s.table.slots();
    let mask = slots.len() - 1;
    let mut stored = 0usize;

    for (index, &key) in slots.iter().enumerate() {
        if key == FREE_KEY {
            continue;
        }
        stored += 1;

        // Every slot between the home slot and the key must be occupied, or a
        // lookup would stop short of it.
        let mut cursor = s.table.home_slot(key);
        while cursor != index {
            assert_ne!(
                slots[cursor], FREE_KEY,
                "gap at {cursor} in chain of {key} stored at {index}"
            );
            cursor = (cursor + 1) & mask;
        }
        assert_eq!(s.table.find(key), Some(index), "key {key} not reachable");
    }

    assert!(stored < slots.len(), "no free slot left");
    assert_eq!(
        stored + usize::from(s.contains(0)),
        s.len(),
        "stored keys must match UintSet::len"
    );
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u64),
    Remove(u64),
    Contains(u64),
    ShrinkToFit,
}

fn key_strategy() -> impl Strategy<Value = u64> + Clone {
    // Mostly a narrow range so that chains collide and removals shift keys.
    prop_oneof![
        8 => 0u64..256,
        2 => any::<u64>(),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => key.clone().prop_map(Op::Insert),
        30 => key.clone().prop_map(Op::Remove),
        19 => key.clone().prop_map(Op::Contains),
        1 => Just(Op::ShrinkToFit),
    ];
    prop::collection::vec(op, 0..=2000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(fill in 0.05f64..0.99, ops in ops_strategy()) {
        let mut s = UintSet::with_capacity_and_fill_factor(1, fill);
        let mut m: BTreeSet<u64> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => prop_assert_eq!(s.insert(key), m.insert(key)),
                Op::Remove(key) => prop_assert_eq!(s.remove(key), m.remove(&key)),
                Op::Contains(key) => prop_assert_eq!(s.contains(key), m.contains(&key)),
                Op::ShrinkToFit => s.shrink_to_fit(),
            }

            prop_assert_eq!(s.len(), m.len());
        }

        validate_set(&s);
        let mut got: Vec<u64> = s.iter().collect();
        got.sort_unstable();
        let expected: Vec<u64> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_insert_then_remove_round_trips(keys in prop::collection::vec(any::<u64>(), 0..500)) {
        let mut s = UintSet::new();
        for &k in &keys {
            s.insert(k);
        }
        let distinct: BTreeSet<u64> = keys.iter().copied().collect();
        prop_assert_eq!(s.len(), distinct.len());
        for &k in &keys {
            prop_assert!(s.contains(k));
        }

        for &k in &distinct {
            prop_assert!(s.remove(k));
            prop_assert!(!s.contains(k));
        }
        prop_assert!(s.is_empty());
        validate_set(&s);
    }

    #[test]
    fn prop_insert_is_idempotent(keys in prop::collection::vec(key_strategy(), 0..300)) {
        let once: UintSet = keys.iter().copied().collect();
        let mut twice = once.clone();
        for &k in &keys {
            prop_assert!(!twice.insert(k));
        }
        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn prop_clone_is_independent(
        keys in prop::collection::vec(key_strategy(), 1..300),
        extra in prop::collection::vec(key_strategy(), 0..100),
    ) {
        let original: UintSet = keys.iter().copied().collect();
        let snapshot: BTreeSet<u64> = keys.iter().copied().collect();

        let mut copy = original.clone();
        for &k in &extra {
            copy.insert(k);
        }
        for &k in &keys {
            copy.remove(k);
        }

        prop_assert_eq!(original.len(), snapshot.len());
        for &k in &snapshot {
            prop_assert!(original.contains(k));
        }
        validate_set(&original);
        validate_set(&copy);
    }

    #[test]
    fn prop_retain_matches_filter(keys in prop::collection::vec(key_strategy(), 0..500), modulus in 1u64..7) {
        let mut s: UintSet = keys.iter().copied().collect();
        s.retain(|&k| k % modulus == 0);

        let expected: BTreeSet<u64> = keys.iter().copied().filter(|k| k % modulus == 0).collect();
        prop_assert_eq!(s.len(), expected.len());
        for &k in &keys {
            prop_assert_eq!(s.contains(k), expected.contains(&k));
        }
        validate_set(&s);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

/// Keys homed at slots 6, 7 and 0 of an 8-slot table, so their chains wrap
/// past the end of the array and interleave with a chain starting at 0.
fn wrapping_keys(s: &UintSet) -> Vec<u64> {
    let mut keys: Vec<u64> = (1u64..).filter(|&k| s.table.home_slot(k) == 7).take(3).collect();
    keys.extend((1u64..).filter(|&k| s.table.home_slot(k) == 6).take(1));
    keys.extend((1u64..).filter(|&k| s.table.home_slot(k) == 0).take(1));
    keys
}

#[test]
fn exhaustive_insert_order_wrapping_chain() {
    let probe = UintSet::with_capacity_and_fill_factor(6, 0.75);
    assert_eq!(probe.slot_count(), 8);
    let keys = wrapping_keys(&probe);

    for_each_permutation(&keys, |perm| {
        let mut s = UintSet::with_capacity_and_fill_factor(6, 0.75);
        for &k in &perm {
            assert!(s.insert(k));
        }
        assert_eq!(s.slot_count(), 8);
        validate_set(&s);
        for &k in &keys {
            assert!(s.contains(k));
        }
    });
}

#[test]
fn exhaustive_remove_order_wrapping_chain() {
    let mut base = UintSet::with_capacity_and_fill_factor(6, 0.75);
    let keys = wrapping_keys(&base);
    for &k in &keys {
        assert!(base.insert(k));
    }
    assert_eq!(base.slot_count(), 8);

    for_each_permutation(&keys, |perm| {
        let mut s = base.clone();
        let mut live: BTreeSet<u64> = keys.iter().copied().collect();

        for k in perm {
            assert!(s.remove(k));
            live.remove(&k);
            validate_set(&s);
            for &other in &live {
                assert!(s.contains(other), "{other} lost after removing {k}");
            }
        }
        assert!(s.is_empty());
    });
}
