//! Error types for pagekv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PageKvError
pub type Result<T> = std::result::Result<T, PageKvError>;

/// Unified error type for pagekv operations
#[derive(Debug, Error)]
pub enum PageKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: '{0}'")]
    KeyNotFound(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Page log corruption detected: {0}")]
    Corruption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Store is not initialized")]
    NotInitialized,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PageKvError {
    /// True for the recoverable "no such key" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, PageKvError::KeyNotFound(_))
    }
}

impl From<bincode::Error> for PageKvError {
    fn from(err: bincode::Error) -> Self {
        PageKvError::Codec(err.to_string())
    }
}
