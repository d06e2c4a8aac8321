//! Shared Store
//!
//! A cloneable handle that lets several threads use one store. Every call takes
//! the same exclusive lock, so a `compact()` (which renames and recreates the
//! backing file) can never interleave with a read or write.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BincodeCodec, Codec};
use crate::error::Result;
use crate::store::{CompactionSummary, Store, StoreStats};

/// Thread-safe handle over a [`Store`]
pub struct SharedStore<C: Codec = BincodeCodec> {
    inner: Arc<Mutex<Store<C>>>,
}

impl<C: Codec> Clone for SharedStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Codec> SharedStore<C> {
    pub fn new(store: Store<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn set<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<()> {
        self.inner.lock().set(key, value)
    }

    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        self.inner.lock().get(key)
    }

    pub fn contains_key(&self, key: &str) -> Result<bool> {
        self.inner.lock().contains_key(key)
    }

    pub fn count_instances(&self, key: &str) -> Result<usize> {
        self.inner.lock().count_instances(key)
    }

    pub fn compact(&self) -> Result<CompactionSummary> {
        self.inner.lock().compact()
    }

    pub fn flush(&self) -> Result<bool> {
        self.inner.lock().flush()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.inner.lock().stats()
    }

    /// Run `f` with the lock held for several calls in a row
    pub fn with<R>(&self, f: impl FnOnce(&mut Store<C>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
