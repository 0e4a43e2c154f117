//! Store keys
//!
//! A key addresses one entry and is made of two parts:
//! - `space`: the index or table the entry belongs to (e.g. `users_by_login`)
//! - `user_key`: the identifier within that space (e.g. a login handle)
//!
//! ## Rules
//!
//! - Both parts must be non-empty
//! - Neither part may contain NUL bytes (\0)
//! - Size limits are enforced separately by [`crate::Limits`]
//!
//! Keys order by space first, then by user key.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Composite key: (space, user key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    space: String,
    user_key: String,
}

impl Key {
    /// Create a validated key
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_core::Key;
    ///
    /// let key = Key::new("users", "42").unwrap();
    /// assert_eq!(key.space(), "users");
    /// assert!(Key::new("users", "").is_err());
    /// ```
    pub fn new(space: impl Into<String>, user_key: impl Into<String>) -> Result<Self, KeyError> {
        let space = space.into();
        let user_key = user_key.into();
        validate_part(&space, KeyPart::Space)?;
        validate_part(&user_key, KeyPart::UserKey)?;
        Ok(Key { space, user_key })
    }

    /// The space this key belongs to
    #[inline]
    pub fn space(&self) -> &str {
        &self.space
    }

    /// The identifier within the space
    #[inline]
    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    /// Encoded length in bytes (both parts)
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.space.len() + self.user_key.len()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.space, self.user_key)
    }
}

/// Which half of a key failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    /// The space component
    Space,
    /// The user key component
    UserKey,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Space => f.write_str("space"),
            KeyPart::UserKey => f.write_str("user key"),
        }
    }
}

/// Key validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// A key part is empty
    #[error("key cannot be empty")]
    Empty,

    /// A key part contains a NUL byte
    #[error("key {0} cannot contain NUL bytes")]
    ContainsNul(KeyPart),
}

fn validate_part(part: &str, which: KeyPart) -> Result<(), KeyError> {
    if part.is_empty() {
        return Err(KeyError::Empty);
    }
    if part.contains('\x00') {
        return Err(KeyError::ContainsNul(which));
    }
    Ok(())
}
