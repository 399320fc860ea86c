use std::collections::BTreeMap;

use pagetree::{BTree, TreeConfig};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    Insert { key: i64, value: u32 },
    Modify { key: i64, value: u32 },
    Delete { key: i64 },
    Find { key: i64 },
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    // A narrow key range so operations collide with existing entries.
    let key = -64i64..64;
    prop_oneof![
        4 => (key.clone(), any::<u32>()).prop_map(|(key, value)| Operation::Insert { key, value }),
        1 => (key.clone(), any::<u32>()).prop_map(|(key, value)| Operation::Modify { key, value }),
        3 => key.clone().prop_map(|key| Operation::Delete { key }),
        1 => key.prop_map(|key| Operation::Find { key }),
    ]
}

fn open(dir: &tempfile::TempDir, order: usize, cache_capacity: usize) -> BTree<i64, u32> {
    let config = TreeConfig::builder()
        .order(order)
        .cache_capacity(cache_capacity)
        .build();
    BTree::open_with_config(dir.path().join("prop.idx"), config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_matches_btreemap_model(
        ops in prop::collection::vec(arb_operation(), 1..400),
        order in 3usize..9,
        cache_capacity in 1usize..6,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = open(&dir, order, cache_capacity);
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Operation::Insert { key, value } => {
                    let fresh = !model.contains_key(&key);
                    if fresh {
                        model.insert(key, value);
                    }
                    prop_assert_eq!(tree.insert(&key, value).unwrap(), fresh);
                }
                Operation::Modify { key, value } => {
                    let present = model.contains_key(&key);
                    if present {
                        model.insert(key, value);
                    }
                    prop_assert_eq!(tree.modify(&key, value).unwrap(), present);
                }
                Operation::Delete { key } => {
                    prop_assert_eq!(tree.delete(&key).unwrap(), model.remove(&key).is_some());
                }
                Operation::Find { key } => {
                    prop_assert_eq!(tree.find(&key).unwrap(), model.get(&key).copied());
                }
            }
            prop_assert_eq!(tree.len(), model.len() as u64);
        }

        let report = tree.verify().unwrap();
        prop_assert_eq!(report.entry_count, model.len() as u64);
        for (key, value) in &model {
            prop_assert_eq!(tree.find(key).unwrap(), Some(*value));
        }
    }

    #[test]
    fn prop_reopen_preserves_contents(
        keys in prop::collection::btree_set(any::<i64>(), 0..300),
        order in 3usize..12,
    ) {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut tree = open(&dir, order, 8);
            for (i, key) in keys.iter().enumerate() {
                prop_assert!(tree.insert(key, i as u32).unwrap());
            }
            tree.close().unwrap();
        }

        let tree = open(&dir, order, 8);
        prop_assert_eq!(tree.len(), keys.len() as u64);
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(tree.find(key).unwrap(), Some(i as u32));
        }
        tree.verify().unwrap();
    }
}
