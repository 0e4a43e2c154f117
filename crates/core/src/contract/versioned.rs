//! Value plus version wrapper
//!
//! Every successful read returns a `Versioned<T>`: the stored value, the
//! version of the commit that wrote it, and that commit's timestamp. The
//! version is what callers feed back into [`crate::AtomicGroup::check`].

use super::{Timestamp, Version};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A value with the version that wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The stored data
    pub value: T,

    /// Version of the commit that wrote `value`
    pub version: Version,

    /// Commit time
    pub timestamp: Timestamp,
}

/// Raw read result from the store
pub type VersionedValue = Versioned<Value>;

impl<T> Versioned<T> {
    /// Wrap a value with an explicit version and timestamp
    pub fn new(value: T, version: Version, timestamp: Timestamp) -> Self {
        Versioned {
            value,
            version,
            timestamp,
        }
    }

    /// Transform the payload, keeping version metadata
    pub fn map<U, F>(self, f: F) -> Versioned<U>
    where
        F: FnOnce(T) -> U,
    {
        Versioned {
            value: f(self.value),
            version: self.version,
            timestamp: self.timestamp,
        }
    }

    /// Fallible transform, keeping version metadata
    pub fn try_map<U, E, F>(self, f: F) -> Result<Versioned<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        Ok(Versioned {
            value: f(self.value)?,
            version: self.version,
            timestamp: self.timestamp,
        })
    }

    /// Borrow the payload
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Take the payload, discarding version metadata
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }
}
