//! # pagekv
//!
//! An embedded, single-file, log-structured key-value store with:
//! - An in-memory ordered buffer (memtable) for recent writes
//! - Immutable sorted pages with bloom filters, appended to one data file
//! - Newest-first lookups across memtable and pages
//! - Offline compaction that keeps only the newest value per key
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Store (single caller)                    │
//! │        set / get / count_instances / compact / stats         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐  flush   ┌─────────────┐
//!   │  MemTable   │ ───────▶ │    Page     │
//!   │ (BST arena) │          │ sorted+bloom│
//!   └─────────────┘          └──────┬──────┘
//!                                   │ append / scan backward
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   PageLog   │
//!                           │ (data file) │
//!                           └─────────────┘
//! ```
//!
//! ```no_run
//! use pagekv::{Config, Store};
//!
//! # fn main() -> pagekv::Result<()> {
//! let config = Config::builder().data_path("./data.dat").build();
//! let mut store = Store::open(config)?;
//! store.set("greeting", "hello")?;
//! let value: String = store.get("GREETING")?;
//! assert_eq!(value, "hello");
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod key;
pub mod memtable;
pub mod storage;
pub mod store;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PageKvError, Result};
pub use config::Config;
pub use codec::{BincodeCodec, Codec};
pub use store::{CompactionSummary, Store, StoreStats};
pub use shared::SharedStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pagekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
