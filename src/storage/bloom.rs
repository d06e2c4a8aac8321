//! Bloom Filter
//!
//! Fixed-size bit array membership test attached to every page.
//!
//! Each key maps to `hash_count` addresses drawn from a PRNG seeded with the
//! CRC32 of the case-folded key. The sequence depends on nothing but the key,
//! so a filter rebuilt or decoded elsewhere answers identically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{PageKvError, Result};
use crate::key::fold_key;

/// Most hash rounds a filter may use; decoded filters above this are corrupt
pub const MAX_HASH_COUNT: usize = 64;

/// Probabilistic set of keys: no false negatives, tunable false positives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    /// Number of addressable bits (`m`)
    size: usize,
    /// Addresses set per key (`k`)
    hash_count: usize,
    /// Packed bits, LSB first within each byte
    bits: Vec<u8>,
}

impl BloomFilter {
    /// Allocate `size` clear bits with `hash_count` rounds per key.
    /// Both are raised to at least 1; `hash_count` is capped at
    /// [`MAX_HASH_COUNT`].
    pub fn new(size: usize, hash_count: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            hash_count: hash_count.clamp(1, MAX_HASH_COUNT),
            bits: vec![0u8; size.div_ceil(8)],
        }
    }

    /// Size a filter for `expected_keys` at roughly `false_positive_rate`
    pub fn with_rate(expected_keys: usize, false_positive_rate: f64) -> Self {
        let n = expected_keys.max(1) as f64;
        let p = false_positive_rate.clamp(1e-9, 0.5);
        let ln2 = std::f64::consts::LN_2;

        let bits = (-(n * p.ln()) / (ln2 * ln2)).ceil().max(8.0);
        let hashes = ((bits / n) * ln2).round().max(1.0);

        Self::new(bits as usize, hashes as usize)
    }

    /// Set the `k` bits for `key`
    pub fn add(&mut self, key: &str) {
        for address in self.addresses(key) {
            self.bits[address / 8] |= 1u8 << (address % 8);
        }
    }

    /// True if every bit for `key` is set. May be a false positive.
    pub fn contains(&self, key: &str) -> bool {
        self.addresses(key)
            .all(|address| self.bits[address / 8] & (1u8 << (address % 8)) != 0)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Number of bits currently set
    pub fn bits_set(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Expected false-positive probability after `inserted` distinct keys
    pub fn estimated_false_positive_rate(&self, inserted: usize) -> f64 {
        let k = self.hash_count as f64;
        let exponent = -k * inserted as f64 / self.size as f64;
        (1.0 - exponent.exp()).powf(k)
    }

    /// Check fields that came from outside `new`, such as a decoded page.
    ///
    /// `add`/`contains` index `bits` by `address / 8` and divide by `size`, so
    /// both must agree before any lookup runs.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(PageKvError::Corruption(
                "bloom filter has zero bits".to_string(),
            ));
        }
        if self.hash_count == 0 || self.hash_count > MAX_HASH_COUNT {
            return Err(PageKvError::Corruption(format!(
                "bloom filter hash count {} outside 1..={}",
                self.hash_count, MAX_HASH_COUNT
            )));
        }
        let expected = self.size.div_ceil(8);
        if self.bits.len() != expected {
            return Err(PageKvError::Corruption(format!(
                "bloom filter of {} bits holds {} bytes, expected {}",
                self.size,
                self.bits.len(),
                expected
            )));
        }
        Ok(())
    }

    fn addresses(&self, key: &str) -> impl Iterator<Item = usize> {
        let seed = crc32fast::hash(fold_key(key).as_bytes());
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        let size = self.size;
        (0..self.hash_count).map(move |_| rng.gen::<u32>() as usize % size)
    }
}
