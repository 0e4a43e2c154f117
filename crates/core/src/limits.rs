//! Size limits for keys and values
//!
//! Enforced by the engine on every mutation of an atomic group. Reads are
//! never limited. Custom limits can be set at database open time.

use crate::key::Key;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size limits for keys and values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum key length in bytes, both parts combined (default: 2048)
    #[serde(default = "default_max_key_bytes")]
    pub max_key_bytes: usize,

    /// Maximum value length in bytes (default: 64 KiB)
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,
}

fn default_max_key_bytes() -> usize {
    2048
}

fn default_max_value_bytes() -> usize {
    64 * 1024
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: default_max_key_bytes(),
            max_value_bytes: default_max_value_bytes(),
        }
    }
}

impl Limits {
    /// Small limits for unit tests that exercise enforcement
    pub fn with_small_limits() -> Self {
        Limits {
            max_key_bytes: 32,
            max_value_bytes: 256,
        }
    }

    /// Validate a key length
    pub fn validate_key(&self, key: &Key) -> Result<(), LimitError> {
        let actual = key.encoded_len();
        if actual > self.max_key_bytes {
            return Err(LimitError::KeyTooLong {
                actual,
                max: self.max_key_bytes,
            });
        }
        Ok(())
    }

    /// Validate a value length
    pub fn validate_value(&self, value: &Value) -> Result<(), LimitError> {
        let actual = value.len();
        if actual > self.max_value_bytes {
            return Err(LimitError::ValueTooLarge {
                actual,
                max: self.max_value_bytes,
            });
        }
        Ok(())
    }
}

/// Limit violations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitError {
    /// Key exceeds maximum length
    #[error("key too long: {actual} bytes exceeds maximum {max}")]
    KeyTooLong {
        /// Actual key length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Value exceeds maximum size
    #[error("value too large: {actual} bytes exceeds maximum {max}")]
    ValueTooLarge {
        /// Actual value size in bytes
        actual: usize,
        /// Maximum allowed size
        max: usize,
    },
}
