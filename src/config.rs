//! Configuration for pagekv
//!
//! Centralized configuration with sensible defaults.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{PageKvError, Result};
use crate::storage::MAX_HASH_COUNT;

/// Main configuration for a pagekv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// The page log file. Compaction temporarily renames it to
    /// `{data_path}.compact` in the same directory.
    pub data_path: PathBuf,

    /// fsync the page log after every appended page
    pub sync_on_flush: bool,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Number of distinct keys the memtable holds before it is flushed as a page
    pub flush_threshold: usize,

    // -------------------------------------------------------------------------
    // Page Configuration
    // -------------------------------------------------------------------------
    /// Bloom filter size in bits for each page
    pub bloom_bits: usize,

    /// Hash rounds (bits set) per key in each page's bloom filter
    pub bloom_hashes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./pagekv.dat"),
            sync_on_flush: true,
            flush_threshold: 1024,
            bloom_bits: 8192,
            bloom_hashes: 3,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path the page log is moved to while a compaction runs
    pub fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self
            .data_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("pagekv.dat"));
        name.push(".compact");
        self.data_path.with_file_name(name)
    }

    /// Reject settings the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(PageKvError::Config(
                "flush_threshold must be at least 1".to_string(),
            ));
        }
        if self.bloom_bits == 0 {
            return Err(PageKvError::Config(
                "bloom_bits must be at least 1".to_string(),
            ));
        }
        if self.bloom_hashes == 0 || self.bloom_hashes > MAX_HASH_COUNT {
            return Err(PageKvError::Config(format!(
                "bloom_hashes must be between 1 and {}",
                MAX_HASH_COUNT
            )));
        }
        if self.data_path.file_name().is_none() {
            return Err(PageKvError::Config(format!(
                "data_path has no file name: {}",
                self.data_path.display()
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the page log file path
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_path = path.into();
        self
    }

    /// Set whether each appended page is fsynced
    pub fn sync_on_flush(mut self, sync: bool) -> Self {
        self.config.sync_on_flush = sync;
        self
    }

    /// Set the memtable flush threshold (in distinct keys)
    pub fn flush_threshold(mut self, keys: usize) -> Self {
        self.config.flush_threshold = keys;
        self
    }

    /// Set the per-page bloom filter size (in bits)
    pub fn bloom_bits(mut self, bits: usize) -> Self {
        self.config.bloom_bits = bits;
        self
    }

    /// Set the per-page bloom filter hash rounds
    pub fn bloom_hashes(mut self, rounds: usize) -> Self {
        self.config.bloom_hashes = rounds;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
