//! Property-Based Tests for Cache Module
//!
//! Checks the store against a plain HashMap model while nothing expires.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::CacheStore;

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Small key space so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-d]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Within the TTL the store behaves exactly like a map with overwrite
    // on set and removal on invalidate.
    #[test]
    fn prop_matches_map_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new(TEST_TTL);
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value.clone());
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key).cloned());
                }
                CacheOp::Invalidate { key } => {
                    store.invalidate(&key);
                    model.remove(&key);
                }
            }
            prop_assert_eq!(store.len(), model.len());
        }
    }

    #[test]
    fn prop_invalidate_then_get_is_miss(key in key_strategy(), value in value_strategy()) {
        let mut store = CacheStore::new(TEST_TTL);

        store.set(key.clone(), value.clone());
        prop_assert_eq!(store.get(&key), Some(value));

        store.invalidate(&key);
        prop_assert!(store.get(&key).is_none());
    }

    #[test]
    fn prop_cleanup_keeps_live_entries(
        entries in prop::collection::hash_map(key_strategy(), value_strategy(), 0..10)
    ) {
        let mut store = CacheStore::new(TEST_TTL);
        for (key, value) in &entries {
            store.set(key.clone(), value.clone());
        }

        prop_assert_eq!(store.cleanup_expired(), 0);
        prop_assert_eq!(store.len(), entries.len());
    }
}
