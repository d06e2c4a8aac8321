//! MemTable Module
//!
//! In-memory buffer for the most recent, not yet flushed writes.
//!
//! ## Responsibilities
//! - Insert or replace values by key
//! - Point lookups that report `KeyNotFound` so callers can fall through to pages
//! - Sorted draining for page construction
//!
//! ## Data Structure Choice
//! An unbalanced binary search tree stored in an arena (`Vec` of nodes linked by
//! index). Insertion, lookup and in-order traversal are all loops over explicit
//! state, never recursion, so depth is limited by memory rather than by the call
//! stack. The flush threshold bounds how large (and how deep) a tree gets.

mod table;

use serde::{Deserialize, Serialize};

pub use table::{MemTable, MemTableIter};

/// A key with its codec-encoded value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
