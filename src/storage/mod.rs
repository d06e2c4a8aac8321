//! Storage Module
//!
//! Persistent side of the store: pages and the file that holds them.
//!
//! ## Responsibilities
//! - Immutable sorted pages with bloom filters for negative lookups
//! - Appending pages to a single log file
//! - Newest-first page scans shared by lookups, counting and compaction
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Page record (oldest)                   │
//! │ ┌──────────────────────┬─────────────┐ │
//! │ │ Page bytes (codec)   │ Len u32 LE  │ │
//! │ └──────────────────────┴─────────────┘ │
//! ├────────────────────────────────────────┤
//! │ ... one record per flush ...           │
//! ├────────────────────────────────────────┤
//! │ Page record (newest)                   │
//! │ ┌──────────────────────┬─────────────┐ │
//! │ │ Page bytes (codec)   │ Len u32 LE  │ │
//! │ └──────────────────────┴─────────────┘ │
//! └────────────────────────────────────────┘
//! ```
//! Page bytes hold the sorted `(key, value)` entries followed by the filter
//! state. There is no header, footer or magic number.

mod bloom;
mod log;
mod page;

pub use bloom::{BloomFilter, MAX_HASH_COUNT};
pub use log::{PageLog, ScanControl, LENGTH_PREFIX_SIZE};
pub use page::{Page, Probe, DEFAULT_BLOOM_BITS, DEFAULT_BLOOM_HASHES};
