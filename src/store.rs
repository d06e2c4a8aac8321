//! Store Module
//!
//! The key-value store that coordinates the memtable and the page log.
//!
//! ## Responsibilities
//! - Buffer writes in the memtable and flush full memtables as pages
//! - Resolve reads memtable first, then pages newest to oldest
//! - Count physical copies of a key for diagnostics
//! - Rewrite the page log during compaction
//!
//! ## Lifecycle
//! ```text
//! Uninitialized ──initialize()/reopen()──▶ Open ──compact()──▶ Open
//!       ▲                                   │
//!       └──────────────clear()──────────────┘
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BincodeCodec, Codec};
use crate::config::Config;
use crate::error::{PageKvError, Result};
use crate::key::fold_key;
use crate::memtable::MemTable;
use crate::storage::{Page, PageLog, ScanControl};

/// Embedded single-file key-value store
///
/// ## Concurrency Model: single caller
///
/// Every operation takes `&mut self` and runs its I/O inline; there is no
/// internal locking. Use [`crate::SharedStore`] to share one store between
/// threads.
pub struct Store<C: Codec = BincodeCodec> {
    /// Store configuration
    config: Config,

    /// Codec for values and pages, held for the store's lifetime
    codec: C,

    /// Writes not yet flushed to a page
    memtable: MemTable,

    /// Backing file; `None` while uninitialized
    log: Option<PageLog>,
}

/// Per-key physical copy counts plus file totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Pages in the log
    pub page_count: usize,
    /// Entries across all pages, stale copies included
    pub page_entries: usize,
    /// Entries waiting in the memtable
    pub memtable_entries: usize,
    /// Size of the backing file in bytes
    pub file_len: u64,
    /// Case-folded key → number of copies in memtable and pages
    pub instances: BTreeMap<String, usize>,
}

impl StoreStats {
    /// Number of distinct keys
    pub fn distinct_keys(&self) -> usize {
        self.instances.len()
    }

    /// Copies that a compaction would drop
    pub fn stale_entries(&self) -> usize {
        self.page_entries + self.memtable_entries - self.distinct_keys()
    }
}

/// What a compaction pass read and kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionSummary {
    pub pages_read: usize,
    pub entries_read: usize,
    pub entries_kept: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl Store<BincodeCodec> {
    /// Create an uninitialized store using bincode
    pub fn new(config: Config) -> Result<Self> {
        Self::with_codec(config, BincodeCodec)
    }

    /// Create a store and initialize it (fresh, empty file)
    pub fn open(config: Config) -> Result<Self> {
        let mut store = Self::new(config)?;
        store.initialize()?;
        Ok(store)
    }

    /// Attach to the page log at `config.data_path`, keeping its pages.
    /// A missing file is created empty.
    pub fn reopen(config: Config) -> Result<Self> {
        let mut store = Self::new(config)?;
        store.attach()?;
        Ok(store)
    }

    /// Attach to the page log at `config.data_path`, failing if it is missing
    pub fn reopen_existing(config: Config) -> Result<Self> {
        let mut store = Self::new(config)?;
        store.attach_existing()?;
        Ok(store)
    }
}

impl<C: Codec> Store<C> {
    /// Create an uninitialized store with a custom codec
    pub fn with_codec(config: Config, codec: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            codec,
            memtable: MemTable::new(),
            log: None,
        })
    }

    /// Discard any existing backing file, create an empty one and reset the
    /// memtable
    pub fn initialize(&mut self) -> Result<()> {
        self.log = None;
        self.memtable = MemTable::new();
        self.log = Some(PageLog::create(
            &self.config.data_path,
            self.config.sync_on_flush,
        )?);

        tracing::info!(
            path = %self.config.data_path.display(),
            flush_threshold = self.config.flush_threshold,
            "initialized store"
        );
        Ok(())
    }

    /// Open the existing backing file (or create it) with an empty memtable
    pub fn attach(&mut self) -> Result<()> {
        self.attach_with(true)
    }

    /// Open the existing backing file with an empty memtable. A missing file
    /// is a `Storage` error and nothing is created.
    pub fn attach_existing(&mut self) -> Result<()> {
        self.attach_with(false)
    }

    fn attach_with(&mut self, create_missing: bool) -> Result<()> {
        let path = &self.config.data_path;
        self.log = None;
        self.memtable = MemTable::new();

        let log = if PageLog::exists(path) {
            PageLog::open(path, self.config.sync_on_flush)?
        } else if create_missing {
            PageLog::create(path, self.config.sync_on_flush)?
        } else {
            return Err(PageKvError::Storage(format!(
                "no page log at {}",
                path.display()
            )));
        };
        self.log = Some(log);

        tracing::info!(path = %path.display(), "attached store");
        Ok(())
    }

    /// True once `initialize` or `attach` has run and `clear` has not
    pub fn is_open(&self) -> bool {
        self.log.is_some()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Encode `value` and store it under `key`
    pub fn set<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<()> {
        let bytes = self.codec.encode(value)?;
        self.set_raw(key, bytes)
    }

    /// Store already-encoded bytes under `key`
    ///
    /// Flushes the memtable as a page once it holds `flush_threshold` keys.
    /// If that flush fails the write stays buffered and the next write at the
    /// threshold retries it.
    pub fn set_raw(&mut self, key: impl Into<String>, value: Vec<u8>) -> Result<()> {
        let log = self.log.as_mut().ok_or(PageKvError::NotInitialized)?;
        Self::write(&mut self.memtable, log, &self.codec, &self.config, key.into(), value)
    }

    /// Flush the memtable as a page even if it is below the threshold.
    ///
    /// Returns `false` when there was nothing to flush.
    pub fn flush(&mut self) -> Result<bool> {
        let log = self.log.as_mut().ok_or(PageKvError::NotInitialized)?;
        if self.memtable.is_empty() {
            return Ok(false);
        }
        Self::flush_memtable(&mut self.memtable, log, &self.codec, &self.config)?;
        Ok(true)
    }

    fn write(
        memtable: &mut MemTable,
        log: &mut PageLog,
        codec: &C,
        config: &Config,
        key: String,
        value: Vec<u8>,
    ) -> Result<()> {
        memtable.set(key, value);
        if memtable.count() >= config.flush_threshold {
            Self::flush_memtable(memtable, log, codec, config)?;
        }
        Ok(())
    }

    fn flush_memtable(
        memtable: &mut MemTable,
        log: &mut PageLog,
        codec: &C,
        config: &Config,
    ) -> Result<()> {
        let entries = memtable.count();
        let page = Page::from_entries(
            memtable.to_sorted_entries(),
            config.bloom_bits,
            config.bloom_hashes,
        );
        let bytes = page.encode(codec)?;
        let offset = log.append(&bytes)?;
        memtable.clear();

        tracing::debug!(entries, bytes = bytes.len(), offset, "flushed memtable");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get and decode the newest value for `key`
    pub fn get<V: DeserializeOwned>(&mut self, key: &str) -> Result<V> {
        let bytes = self.get_raw(key)?;
        self.codec.decode(&bytes)
    }

    /// Get the newest encoded value for `key`
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. Pages, newest to oldest, stopping at the first hit
    pub fn get_raw(&mut self, key: &str) -> Result<Vec<u8>> {
        let log = self.log.as_mut().ok_or(PageKvError::NotInitialized)?;

        match self.memtable.get(key) {
            Ok(value) => return Ok(value.to_vec()),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let mut found = None;
        log.scan_pages(&self.codec, |page| match page.get(key) {
            Ok(value) => {
                found = Some(value.to_vec());
                Ok(ScanControl::Stop)
            }
            Err(e) if e.is_not_found() => Ok(ScanControl::Continue),
            Err(e) => Err(e),
        })?;

        found.ok_or_else(|| PageKvError::KeyNotFound(key.to_string()))
    }

    /// True if any copy of `key` exists
    pub fn contains_key(&mut self, key: &str) -> Result<bool> {
        Ok(self.count_instances(key)? > 0)
    }

    /// Physical copies of `key`: at most one from the memtable plus one per
    /// page holding it. Every page is visited; stale copies are counted.
    pub fn count_instances(&mut self, key: &str) -> Result<usize> {
        let log = self.log.as_mut().ok_or(PageKvError::NotInitialized)?;

        let mut instances = usize::from(self.memtable.contains(key));
        log.scan_pages(&self.codec, |page| {
            if page.contains(key) {
                instances += 1;
            }
            Ok(ScanControl::Continue)
        })?;

        Ok(instances)
    }

    /// Copy counts for every key plus page and file totals
    pub fn stats(&mut self) -> Result<StoreStats> {
        let log = self.log.as_mut().ok_or(PageKvError::NotInitialized)?;

        let mut stats = StoreStats {
            memtable_entries: self.memtable.count(),
            file_len: log.len()?,
            ..StoreStats::default()
        };
        for (key, _) in self.memtable.iter() {
            *stats.instances.entry(fold_key(key)).or_default() += 1;
        }

        log.scan_pages(&self.codec, |page| {
            stats.page_count += 1;
            stats.page_entries += page.count();
            for entry in page.entries() {
                *stats.instances.entry(fold_key(&entry.key)).or_default() += 1;
            }
            Ok(ScanControl::Continue)
        })?;

        Ok(stats)
    }

    // =========================================================================
    // Compaction
    // =========================================================================

    /// Rewrite the page log so every key appears once with its newest value.
    ///
    /// Steps:
    /// 1. Move the log to the temporary path
    /// 2. Start a fresh, empty log and memtable
    /// 3. Re-set the unflushed memtable entries (they are the newest)
    /// 4. Scan the old pages newest to oldest, re-setting unseen keys
    /// 5. Delete the temporary file
    ///
    /// If any step before 5 fails, the partial new log is discarded and the
    /// old log and memtable stay in place.
    pub fn compact(&mut self) -> Result<CompactionSummary> {
        let data_path = self.config.data_path.clone();
        let temp_path = self.config.temp_path();
        let log = self.log.as_mut().ok_or(PageKvError::NotInitialized)?;

        let mut summary = CompactionSummary {
            bytes_before: log.len()?,
            ..CompactionSummary::default()
        };
        log.rename_to(&temp_path)?;
        tracing::info!(temp = %temp_path.display(), bytes = summary.bytes_before, "compaction started");

        let fresh = match PageLog::create(&data_path, self.config.sync_on_flush) {
            Ok(fresh) => fresh,
            Err(e) => {
                Self::restore_log(log, &data_path);
                return Err(e);
            }
        };
        let mut old = std::mem::replace(log, fresh);

        let mut rebuilt = MemTable::new();
        let rewritten = Self::rewrite(
            &mut rebuilt,
            log,
            &mut old,
            &self.codec,
            &self.config,
            &self.memtable,
            &mut summary,
        );
        if let Err(e) = rewritten {
            tracing::warn!(error = %e, "compaction failed, keeping old page log");
            drop(std::mem::replace(log, old));
            Self::restore_log(log, &data_path);
            return Err(e);
        }

        self.memtable = rebuilt;
        summary.bytes_after = log.len()?;
        old.delete()?;

        tracing::info!(
            pages_read = summary.pages_read,
            entries_read = summary.entries_read,
            entries_kept = summary.entries_kept,
            bytes_before = summary.bytes_before,
            bytes_after = summary.bytes_after,
            "compaction finished"
        );
        Ok(summary)
    }

    /// Steps 3 and 4 of `compact`: fill `log` and `memtable` from the pending
    /// entries and then the old pages
    fn rewrite(
        memtable: &mut MemTable,
        log: &mut PageLog,
        old: &mut PageLog,
        codec: &C,
        config: &Config,
        pending: &MemTable,
        summary: &mut CompactionSummary,
    ) -> Result<()> {
        let mut seen: HashSet<String> = HashSet::new();

        for entry in pending.to_sorted_entries() {
            summary.entries_read += 1;
            seen.insert(fold_key(&entry.key));
            summary.entries_kept += 1;
            Self::write(memtable, log, codec, config, entry.key, entry.value)?;
        }

        old.scan_pages(codec, |page| {
            summary.pages_read += 1;
            for entry in page.into_entries() {
                summary.entries_read += 1;
                if seen.insert(fold_key(&entry.key)) {
                    summary.entries_kept += 1;
                    Self::write(memtable, log, codec, config, entry.key, entry.value)?;
                }
            }
            Ok(ScanControl::Continue)
        })
    }

    /// Move a log that was renamed aside back to `data_path`
    fn restore_log(log: &mut PageLog, data_path: &Path) {
        if let Err(e) = log.rename_to(data_path) {
            tracing::error!(
                path = %log.path().display(),
                error = %e,
                "could not move page log back after failed compaction"
            );
        }
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Close the handle and delete the backing file. The store returns to the
    /// uninitialized state; call `initialize` to use it again.
    pub fn clear(&mut self) -> Result<()> {
        self.memtable = MemTable::new();
        match self.log.take() {
            Some(log) => log.delete(),
            None if PageLog::exists(&self.config.data_path) => {
                std::fs::remove_file(&self.config.data_path)?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Flush pending writes and sync the backing file
    pub fn close(mut self) -> Result<()> {
        if self.log.is_none() {
            return Ok(());
        }
        self.flush()?;
        if let Some(log) = self.log.as_mut() {
            log.sync()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Keys waiting in the memtable
    pub fn memtable_len(&self) -> usize {
        self.memtable.count()
    }

    /// Number of pages in the log
    pub fn page_count(&mut self) -> Result<usize> {
        self.log
            .as_mut()
            .ok_or(PageKvError::NotInitialized)?
            .page_count()
    }

    /// Size of the backing file in bytes
    pub fn file_len(&self) -> Result<u64> {
        self.log.as_ref().ok_or(PageKvError::NotInitialized)?.len()
    }
}
