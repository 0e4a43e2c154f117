//! Stored values
//!
//! The store treats values as opaque bytes. Typed callers encode once with
//! [`Value::encode`] and decode with [`Value::decode`]; MessagePack with named
//! fields keeps records self-describing so optional fields survive schema growth.
//!
//! Writing the same `Value` under several keys stores byte-identical copies.

use crate::error::RosterResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque stored payload
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value(Vec<u8>);

impl Value {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value(bytes.into())
    }

    /// Encode a serializable record
    pub fn encode<T: Serialize + ?Sized>(record: &T) -> RosterResult<Self> {
        Ok(Value(rmp_serde::to_vec_named(record)?))
    }

    /// Decode into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> RosterResult<T> {
        Ok(rmp_serde::from_slice(&self.0)?)
    }

    /// Raw bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({} bytes)", self.0.len())
    }
}
