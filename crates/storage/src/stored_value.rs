//! Storage-layer entry wrapper
//!
//! Callers only ever see `VersionedValue`. Inside the store a version chain
//! also needs to remember deletions so that a reader at an older version
//! still finds the value that was live then. `StoredValue` is either a live
//! value or a tombstone, each stamped with the commit that produced it.

use roster_core::{Timestamp, Value, Version, VersionedValue};

/// One entry in a version chain
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    /// `None` marks a deletion
    value: Option<Value>,
    version: Version,
    timestamp: Timestamp,
}

impl StoredValue {
    /// A live value written at `version`
    pub fn live(value: Value, version: Version, timestamp: Timestamp) -> Self {
        StoredValue {
            value: Some(value),
            version,
            timestamp,
        }
    }

    /// A deletion recorded at `version`
    pub fn tombstone(version: Version, timestamp: Timestamp) -> Self {
        StoredValue {
            value: None,
            version,
            timestamp,
        }
    }

    /// Whether this entry records a deletion
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Commit version
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Commit timestamp
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The value as callers see it; tombstones read as absent
    pub fn to_versioned(&self) -> Option<VersionedValue> {
        self.value
            .as_ref()
            .map(|v| VersionedValue::new(v.clone(), self.version, self.timestamp))
    }
}
