//! Integration tests for pagekv
//!
//! Drives a store with a seeded random workload and checks every answer
//! against an in-memory model keyed the same (case-insensitive) way.

use std::collections::HashMap;

use pagekv::key::fold_key;
use pagekv::{Config, PageKvError, Store};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn random_key(rng: &mut StdRng) -> String {
    let base = format!("user:{}", rng.gen_range(0..200));
    if rng.gen_bool(0.3) {
        base.to_uppercase()
    } else {
        base
    }
}

fn check_model(store: &mut Store, model: &HashMap<String, u64>) {
    for (key, expected) in model {
        assert_eq!(store.get::<u64>(key).unwrap(), *expected, "key {}", key);
    }
}

// =============================================================================
// Workload Tests
// =============================================================================

#[test]
fn test_random_workload_matches_model() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_path(temp_dir.path().join("data.dat"))
        .flush_threshold(32)
        .sync_on_flush(false)
        .build();
    let mut store = Store::open(config).unwrap();
    let mut rng: StdRng = SeedableRng::seed_from_u64(397_427_893);
    let mut model: HashMap<String, u64> = HashMap::new();

    for step in 0..2_000u64 {
        let key = random_key(&mut rng);
        store.set(&key, &step).unwrap();
        model.insert(fold_key(&key), step);
    }

    check_model(&mut store, &model);
    assert!(store.page_count().unwrap() > 1);

    for missing in ["user:200", "nobody", ""] {
        assert!(matches!(
            store.get::<u64>(missing),
            Err(PageKvError::KeyNotFound(_))
        ));
    }

    let before = store.stats().unwrap();
    assert!(before.stale_entries() > 0);

    store.compact().unwrap();

    let after = store.stats().unwrap();
    assert_eq!(after.stale_entries(), 0);
    assert_eq!(after.distinct_keys(), model.len());
    assert!(after.file_len < before.file_len);
    check_model(&mut store, &model);
}

#[test]
fn test_workload_survives_reopen_and_compaction() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_path(temp_dir.path().join("data.dat"))
        .flush_threshold(16)
        .sync_on_flush(false)
        .build();
    let mut rng: StdRng = SeedableRng::seed_from_u64(42);
    let mut model: HashMap<String, u64> = HashMap::new();

    let mut store = Store::open(config.clone()).unwrap();
    for step in 0..500u64 {
        let key = random_key(&mut rng);
        store.set(&key, &step).unwrap();
        model.insert(fold_key(&key), step);
    }
    store.close().unwrap();

    let mut store = Store::reopen(config.clone()).unwrap();
    check_model(&mut store, &model);
    store.compact().unwrap();
    store.close().unwrap();

    let mut store = Store::reopen(config).unwrap();
    check_model(&mut store, &model);
    for key in model.keys() {
        assert_eq!(store.count_instances(key).unwrap(), 1);
    }
}
