//! Page Tests
//!
//! These tests verify:
//! - Building pages from memtables
//! - Bloom fast-reject versus binary-search miss
//! - Binary search termination at both ends of the key range
//! - Encode/decode with invariant checks, filter fields included

use pagekv::codec::{BincodeCodec, Codec};
use pagekv::memtable::{Entry, MemTable};
use pagekv::storage::{BloomFilter, Page, Probe, MAX_HASH_COUNT};
use pagekv::PageKvError;
use serde::Serialize;

// =============================================================================
// Helper Functions
// =============================================================================

fn memtable_with(keys: &[&str]) -> MemTable {
    let mut memtable = MemTable::new();
    for key in keys {
        memtable.set(*key, format!("v-{}", key).into_bytes());
    }
    memtable
}

/// Same field layout as `Page`, for hand-crafting encoded pages
#[derive(Serialize)]
struct RawPage {
    entries: Vec<Entry>,
    filter: BloomFilter,
}

/// Same field layout as `BloomFilter`, with no checks on the values
#[derive(Serialize)]
struct RawFilter {
    size: usize,
    hash_count: usize,
    bits: Vec<u8>,
}

#[derive(Serialize)]
struct RawFilterPage {
    entries: Vec<Entry>,
    filter: RawFilter,
}

fn decode_with_filter(entries: Vec<Entry>, filter: RawFilter) -> pagekv::Result<Page> {
    let codec = BincodeCodec;
    let bytes = codec.encode(&RawFilterPage { entries, filter }).unwrap();
    Page::decode(&bytes, &codec)
}

// =============================================================================
// Build Tests
// =============================================================================

#[test]
fn test_build_sorts_entries() {
    let page = Page::from_memtable(memtable_with(&["pear", "Apple", "fig"]));

    let keys: Vec<&str> = page.entries().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["Apple", "fig", "pear"]);
    assert_eq!(page.count(), 3);
}

#[test]
fn test_build_uses_filter_parameters() {
    let page = Page::build(memtable_with(&["a"]), 1024, 5);

    assert_eq!(page.filter().size(), 1024);
    assert_eq!(page.filter().hash_count(), 5);
}

#[test]
fn test_from_entries_matches_build() {
    let keys = ["Apple", "fig", "pear"];
    let built = Page::from_memtable(memtable_with(&keys));

    let entries = memtable_with(&keys).to_sorted_entries();
    let wrapped = Page::from_entries(entries, 8192, 3);

    assert_eq!(wrapped, built);
}

#[test]
fn test_empty_page() {
    let page = Page::from_memtable(MemTable::new());

    assert!(page.is_empty());
    assert!(!page.contains("a"));
    assert!(page.verify().is_ok());
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_get_every_key() {
    let keys = ["k1", "k2", "k3", "k4", "k5", "k6", "k7"];
    let page = Page::from_memtable(memtable_with(&keys));

    for key in keys {
        assert_eq!(page.get(key).unwrap(), format!("v-{}", key).as_bytes());
        assert!(page.contains(key));
    }
}

#[test]
fn test_get_is_case_insensitive() {
    let page = Page::from_memtable(memtable_with(&["Hello"]));

    assert_eq!(page.get("HELLO").unwrap(), b"v-Hello");
    assert!(page.contains("hello"));
}

#[test]
fn test_absent_key_rejected_by_filter() {
    let page = Page::from_memtable(memtable_with(&["only"]));

    assert_eq!(page.probe("definitely-not-here"), Probe::FilterRejected);
    assert!(matches!(
        page.get("definitely-not-here"),
        Err(PageKvError::KeyNotFound(_))
    ));
}

#[test]
fn test_false_positive_falls_through_to_search_miss() {
    // A one-bit filter passes every key, forcing the binary search
    let page = Page::build(memtable_with(&["b", "d", "f"]), 1, 1);

    assert_eq!(page.probe("c"), Probe::Missed);
    assert!(matches!(page.get("c"), Err(PageKvError::KeyNotFound(_))));
}

#[test]
fn test_search_terminates_past_both_ends() {
    let page = Page::build(memtable_with(&["b", "d", "f", "h"]), 1, 1);

    assert_eq!(page.probe("a"), Probe::Missed);
    assert_eq!(page.probe("z"), Probe::Missed);
    assert_eq!(page.probe("b"), Probe::Found(0));
    assert_eq!(page.probe("h"), Probe::Found(3));
}

#[test]
fn test_search_large_page() {
    let mut memtable = MemTable::new();
    for i in 0..1024 {
        memtable.set(format!("key{:05}", i * 2), vec![(i % 256) as u8]);
    }
    let page = Page::build(memtable, 1, 1);

    for i in 0..1024 {
        assert_eq!(page.probe(&format!("key{:05}", i * 2)), Probe::Found(i));
        assert_eq!(page.probe(&format!("key{:05}", i * 2 + 1)), Probe::Missed);
    }
}

// =============================================================================
// Encode / Decode Tests
// =============================================================================

#[test]
fn test_encode_decode_preserves_lookups() {
    let codec = BincodeCodec;
    let keys = ["one", "two", "three", "four"];
    let page = Page::from_memtable(memtable_with(&keys));

    let bytes = page.encode(&codec).unwrap();
    let decoded = Page::decode(&bytes, &codec).unwrap();

    assert_eq!(decoded, page);
    for key in keys {
        assert_eq!(decoded.get(key).unwrap(), page.get(key).unwrap());
    }
}

#[test]
fn test_decode_garbage_is_codec_error() {
    let result = Page::decode(b"not a page", &BincodeCodec);
    assert!(matches!(result, Err(PageKvError::Codec(_))));
}

#[test]
fn test_decode_rejects_unsorted_entries() {
    let codec = BincodeCodec;
    let mut filter = BloomFilter::new(64, 2);
    filter.add("b");
    filter.add("a");
    let raw = RawPage {
        entries: vec![Entry::new("b", b"1".to_vec()), Entry::new("a", b"2".to_vec())],
        filter,
    };

    let bytes = codec.encode(&raw).unwrap();
    let result = Page::decode(&bytes, &codec);

    assert!(matches!(result, Err(PageKvError::Corruption(_))));
}

#[test]
fn test_decode_rejects_filter_missing_key() {
    let codec = BincodeCodec;
    let raw = RawPage {
        entries: vec![Entry::new("a", b"1".to_vec())],
        filter: BloomFilter::new(8192, 3),
    };

    let bytes = codec.encode(&raw).unwrap();
    let result = Page::decode(&bytes, &codec);

    assert!(matches!(result, Err(PageKvError::Corruption(_))));
}

#[test]
fn test_decode_rejects_zero_size_filter() {
    let result = decode_with_filter(
        Vec::new(),
        RawFilter {
            size: 0,
            hash_count: 1,
            bits: Vec::new(),
        },
    );

    assert!(matches!(result, Err(PageKvError::Corruption(_))));
}

#[test]
fn test_decode_rejects_short_filter_bits() {
    let result = decode_with_filter(
        vec![Entry::new("a", b"1".to_vec())],
        RawFilter {
            size: 8192,
            hash_count: 3,
            bits: vec![0xff; 16],
        },
    );

    assert!(matches!(result, Err(PageKvError::Corruption(_))));
}

#[test]
fn test_decode_rejects_hash_count_out_of_range() {
    for hash_count in [0, MAX_HASH_COUNT + 1, usize::MAX] {
        let result = decode_with_filter(
            Vec::new(),
            RawFilter {
                size: 64,
                hash_count,
                bits: vec![0; 8],
            },
        );

        assert!(
            matches!(result, Err(PageKvError::Corruption(_))),
            "hash_count {} accepted",
            hash_count
        );
    }
}

#[test]
fn test_decode_accepts_consistent_filter_fields() {
    let page = decode_with_filter(
        Vec::new(),
        RawFilter {
            size: 9,
            hash_count: MAX_HASH_COUNT,
            bits: vec![0; 2],
        },
    )
    .unwrap();

    assert!(!page.contains("a"));
}
