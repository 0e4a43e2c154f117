//! Commit versions
//!
//! Every committed atomic group is stamped with the next value of a single
//! store-wide counter. All entries written by the same group share that
//! version, so comparing two entries' versions tells which was written later.
//!
//! An absent entry has no version. Checks use `Option<Version>` where `None`
//! means "must not exist".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque version token assigned at commit
///
/// ## Invariants
///
/// - Strictly increasing across commits of one store
/// - Never reused, even after the entry it stamped is deleted
/// - `Version::ZERO` is never assigned to a committed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// The version before any commit
    pub const ZERO: Version = Version(0);

    /// Wrap a raw counter value
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Version(raw)
    }

    /// Raw counter value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The version that follows this one
    #[inline]
    pub const fn next(&self) -> Self {
        Version(self.0 + 1)
    }

    /// Whether this is the initial version
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Zero-padded so versions sort lexically the same way they sort numerically
        write!(f, "{:020}", self.0)
    }
}

impl From<u64> for Version {
    fn from(raw: u64) -> Self {
        Version(raw)
    }
}
