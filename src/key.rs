//! Key ordering
//!
//! Keys are compared case-insensitively everywhere: in the memtable tree, in the
//! page binary search, in bloom filter hashing and in compaction's seen-set.
//! All of them go through these two functions so they can never disagree.

use std::cmp::Ordering;

/// Case-insensitive total order over keys
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Canonical spelling of a key: equal under `compare_keys` iff equal folded
pub fn fold_key(key: &str) -> String {
    key.chars().flat_map(char::to_lowercase).collect()
}
