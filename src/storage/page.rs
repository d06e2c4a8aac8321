//! Immutable Sorted Page
//!
//! The on-disk search unit. A page is built once from a drained memtable and
//! never changes afterwards; compaction writes new pages instead of editing old
//! ones.
//!
//! ## Lookup
//! 1. Bloom filter: a miss answers `KeyNotFound` without touching the entries
//! 2. Binary search over the sorted entries, case-insensitive
//!
//! The search window is `[low, high)` and every step either sets
//! `low = mid + 1` or `high = mid`, so it strictly shrinks and terminates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::error::{PageKvError, Result};
use crate::key::compare_keys;
use crate::memtable::{Entry, MemTable};

use super::BloomFilter;

/// Default bloom filter size per page, in bits
pub const DEFAULT_BLOOM_BITS: usize = 8192;

/// Default bloom filter hash rounds per key
pub const DEFAULT_BLOOM_HASHES: usize = 3;

/// Outcome of looking a key up in a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The bloom filter ruled the key out; no search was done
    FilterRejected,
    /// The filter passed but the search found nothing (false positive)
    Missed,
    /// Found at this position in `entries()`
    Found(usize),
}

/// Sorted entries plus a bloom filter over their keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    entries: Vec<Entry>,
    filter: BloomFilter,
}

impl Page {
    /// Drain `memtable` into a page with the default filter parameters
    pub fn from_memtable(memtable: MemTable) -> Self {
        Self::build(memtable, DEFAULT_BLOOM_BITS, DEFAULT_BLOOM_HASHES)
    }

    /// Drain `memtable` into a page whose filter has `bloom_bits` bits and
    /// `bloom_hashes` rounds
    pub fn build(memtable: MemTable, bloom_bits: usize, bloom_hashes: usize) -> Self {
        Self::from_entries(memtable.into_sorted_entries(), bloom_bits, bloom_hashes)
    }

    /// Wrap entries already in ascending key order, with no duplicate keys
    pub fn from_entries(entries: Vec<Entry>, bloom_bits: usize, bloom_hashes: usize) -> Self {
        let mut filter = BloomFilter::new(bloom_bits, bloom_hashes);
        for entry in &entries {
            filter.add(&entry.key);
        }
        Self { entries, filter }
    }

    /// Look `key` up, reporting which stage answered
    pub fn probe(&self, key: &str) -> Probe {
        if !self.filter.contains(key) {
            return Probe::FilterRejected;
        }

        let mut low = 0;
        let mut high = self.entries.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match compare_keys(key, &self.entries[mid].key) {
                Ordering::Equal => return Probe::Found(mid),
                Ordering::Greater => low = mid + 1,
                Ordering::Less => high = mid,
            }
        }

        Probe::Missed
    }

    /// Get the value for `key`, or `KeyNotFound`
    pub fn get(&self, key: &str) -> Result<&[u8]> {
        match self.probe(key) {
            Probe::Found(index) => Ok(self.entries[index].value.as_slice()),
            Probe::FilterRejected | Probe::Missed => {
                Err(PageKvError::KeyNotFound(key.to_string()))
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.probe(key), Probe::Found(_))
    }

    /// Number of entries
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending key order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }

    /// Serialize with `codec`
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>> {
        codec.encode(self)
    }

    /// Deserialize with `codec` and check the page invariants
    pub fn decode<C: Codec>(bytes: &[u8], codec: &C) -> Result<Self> {
        let page: Page = codec.decode(bytes)?;
        page.verify()?;
        Ok(page)
    }

    /// Filter fields consistent, keys strictly ascending and every key
    /// present in the filter
    pub fn verify(&self) -> Result<()> {
        self.filter.validate()?;

        for pair in self.entries.windows(2) {
            if compare_keys(&pair[0].key, &pair[1].key) != Ordering::Less {
                return Err(PageKvError::Corruption(format!(
                    "page keys out of order: '{}' before '{}'",
                    pair[0].key, pair[1].key
                )));
            }
        }

        if let Some(entry) = self.entries.iter().find(|e| !self.filter.contains(&e.key)) {
            return Err(PageKvError::Corruption(format!(
                "page filter is missing key '{}'",
                entry.key
            )));
        }

        Ok(())
    }
}
