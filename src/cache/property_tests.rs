//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against a plain `HashMap` model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheStore, Expiration};
use crate::error::CacheError;

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

/// A cache operation with no expiring entries involved
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Add { key: String, value: String },
    Replace { key: String, value: String },
    Delete { key: String },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Add { key, value }),
        (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Replace { key, value }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Sequential operations from one caller, flushed before every read, match
    // a HashMap model exactly, including add/replace outcomes.
    #[test]
    fn prop_sequential_ops_match_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let rt = runtime();

        rt.block_on(async {
            let store = CacheStore::new(Duration::ZERO);
            let mut model: HashMap<String, String> = HashMap::new();

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        store.set(key.clone(), value.clone(), Expiration::Default).await;
                        model.insert(key, value);
                    }
                    CacheOp::Add { key, value } => {
                        store.flush().await;
                        let result = store.add(key.clone(), value.clone(), Expiration::Default).await;
                        if model.contains_key(&key) {
                            prop_assert_eq!(result, Err(CacheError::AlreadyExists(key)));
                        } else {
                            prop_assert_eq!(result, Ok(()));
                            model.insert(key, value);
                        }
                    }
                    CacheOp::Replace { key, value } => {
                        store.flush().await;
                        let result = store.replace(key.clone(), value.clone(), Expiration::Default).await;
                        if model.contains_key(&key) {
                            prop_assert_eq!(result, Ok(()));
                            model.insert(key, value);
                        } else {
                            prop_assert_eq!(result, Err(CacheError::NotFound(key)));
                        }
                    }
                    CacheOp::Delete { key } => {
                        store.delete(key.clone()).await;
                        model.remove(&key);
                    }
                    CacheOp::Get { key } => {
                        store.flush().await;
                        prop_assert_eq!(store.get(&key).await, model.get(&key).cloned());
                    }
                }
            }

            store.flush().await;
            prop_assert_eq!(store.item_count().await, model.len());
            Ok(())
        })?;
    }

    // The last of several queued writes to one key wins.
    #[test]
    fn prop_last_write_wins(key in key_strategy(), values in prop::collection::vec(value_strategy(), 1..20)) {
        let rt = runtime();

        rt.block_on(async {
            let store = CacheStore::with_queue_capacity(Duration::ZERO, 1);
            for value in &values {
                store.set(key.clone(), value.clone(), Expiration::Default).await;
            }
            store.flush().await;

            let got = store.get(&key).await;
            prop_assert_eq!(got.as_ref(), values.last());
            Ok(())
        })?;
    }

    // Concurrent adds of the same key: exactly one wins and its value is stored.
    #[test]
    fn prop_concurrent_add_has_one_winner(key in key_strategy(), contenders in 2usize..12) {
        let rt = runtime();

        rt.block_on(async {
            let store = CacheStore::new(Duration::ZERO);

            let handles: Vec<_> = (0..contenders)
                .map(|i| {
                    let store = store.clone();
                    let key = key.clone();
                    tokio::spawn(async move {
                        (i, store.add(key, format!("v{}", i), Expiration::Never).await)
                    })
                })
                .collect();

            let mut winners = Vec::new();
            for handle in handles {
                let (i, result) = handle.await.unwrap();
                match result {
                    Ok(()) => winners.push(i),
                    Err(err) => prop_assert_eq!(err, CacheError::AlreadyExists(key.clone())),
                }
            }

            prop_assert_eq!(winners.len(), 1);
            let expected = format!("v{}", winners[0]);
            prop_assert_eq!(store.get(&key).await, Some(expected));
            Ok(())
        })?;
    }
}

// Fewer cases for the time-sensitive expiry property
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // An entry with a short TTL is served before it elapses and never after,
    // without any sweep.
    #[test]
    fn prop_ttl_expiration_behavior(key in key_strategy(), value in value_strategy()) {
        let rt = runtime();

        rt.block_on(async {
            let store = CacheStore::new(Duration::ZERO);
            store.set(key.clone(), value.clone(), Duration::from_millis(40)).await;
            store.flush().await;

            prop_assert_eq!(store.get(&key).await, Some(value));

            tokio::time::sleep(Duration::from_millis(80)).await;

            prop_assert_eq!(store.get(&key).await, None);
            Ok(())
        })?;
    }
}
