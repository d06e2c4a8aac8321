//! Codec Module
//!
//! Turns values and whole pages into bytes and back.
//!
//! The store holds exactly one codec for its lifetime. `BincodeCodec` is the
//! default; any other `Codec` can be plugged in via `Store::with_codec`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Byte codec used for pages and individual values
pub trait Codec {
    /// Serialize a value to bytes
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize bytes into a `T`. Malformed or mismatched input is a
    /// `PageKvError::Codec`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// bincode 1.x with its default (fixed-int, little-endian) options
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(bytes)?)
    }
}
