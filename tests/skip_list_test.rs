//! Property tests for the in-memory skip list against a `BTreeMap` model.

use std::collections::BTreeMap;

use pagecache::index::{SkipList, Value};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(i32, u32),
    Remove(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (-200_i32..200, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => (-200_i32..200).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn prop_inserted_keys_found_with_latest_value(
        entries in proptest::collection::vec((any::<i32>(), any::<u32>()), 0..300),
        seed in any::<u64>(),
    ) {
        let mut list = SkipList::with_seed(seed);
        let mut model = BTreeMap::new();
        for &(k, v) in &entries {
            list.insert(k, v);
            model.insert(k, v);
        }

        prop_assert_eq!(list.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(list.get(k), Some(*v));
        }
    }

    #[test]
    fn prop_removed_keys_not_found(
        keys in proptest::collection::btree_set(-1000_i32..1000, 1..200),
        seed in any::<u64>(),
    ) {
        let mut list = SkipList::with_seed(seed);
        for &k in &keys {
            list.insert(k, k as u32);
        }

        let (gone, kept): (Vec<i32>, Vec<i32>) = keys.iter().partition(|k| *k % 2 == 0);
        for k in &gone {
            prop_assert_eq!(list.remove(k), Some(*k as u32));
        }
        for k in &gone {
            prop_assert_eq!(list.get(k), None);
        }
        for k in &kept {
            prop_assert_eq!(list.get(k), Some(*k as u32));
        }
    }

    #[test]
    fn prop_matches_model_under_mixed_ops(
        ops in proptest::collection::vec(op_strategy(), 0..400),
        seed in any::<u64>(),
    ) {
        let mut list = SkipList::with_seed(seed);
        let mut model: BTreeMap<i32, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    list.insert(k, v);
                    model.insert(k, v);
                }
                Op::Remove(k) => {
                    prop_assert_eq!(list.remove(&k), model.remove(&k));
                }
            }
        }

        let got: Vec<(i32, u32)> = list.iter().map(|(k, v)| (*k, v)).collect();
        let want: Vec<(i32, u32)> = model.into_iter().collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn prop_range_sorted_and_bounded(
        keys in proptest::collection::vec(-500_i32..500, 0..200),
        lo in proptest::option::of(-600_i32..600),
        hi in proptest::option::of(-600_i32..600),
        seed in any::<u64>(),
    ) {
        let mut list = SkipList::with_seed(seed);
        for &k in &keys {
            list.insert(k, 0);
        }

        let got: Vec<i32> = list.range(lo.as_ref(), hi.as_ref()).map(|(k, _)| *k).collect();

        prop_assert!(got.windows(2).all(|w| w[0] <= w[1]));
        if let Some(lo) = lo {
            prop_assert!(got.iter().all(|k| *k >= lo));
        }
        if let Some(hi) = hi {
            prop_assert!(got.iter().all(|k| *k <= hi));
        }

        // Nothing in range was skipped
        let mut expected: Vec<i32> = keys
            .iter()
            .copied()
            .filter(|k| lo.map_or(true, |lo| *k >= lo) && hi.map_or(true, |hi| *k <= hi))
            .collect();
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(got, expected);
    }
}

#[test]
fn test_value_keys_range() {
    let mut list = SkipList::with_seed(77);
    let mut vals: Vec<i32> = (0..250).map(|i| i * 11).collect();
    // Insert in a scrambled but fixed order
    vals.reverse();
    vals.rotate_left(97);
    for v in vals {
        list.insert(Value::Integer(v), v as u32);
    }

    let start = Value::Integer(777);
    let end = Value::Integer(i32::MAX / 2);
    let mut last = i32::MIN;
    let mut count = 0;
    for (key, value) in list.range(Some(&start), Some(&end)) {
        let Value::Integer(k) = *key else {
            panic!("unexpected key type {}", key);
        };
        assert!(k >= 777 && k >= last);
        assert_eq!(value, k as u32);
        last = k;
        count += 1;
    }
    // 777 = 70 * 11 is the first key in range
    assert_eq!(count, 250 - 70);
    assert_eq!(list.iter().count(), 250);
}

#[test]
fn test_varchar_keys() {
    let mut list = SkipList::with_seed(3);
    for name in ["delta", "alpha", "charlie", "bravo"] {
        list.insert(Value::from(name), name.len() as u32);
    }

    let keys: Vec<String> = list.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["'alpha'", "'bravo'", "'charlie'", "'delta'"]);
    assert_eq!(list.get(&Value::from("charlie")), Some(7));
}
