//! Conditional atomic groups
//!
//! An atomic group bundles version checks with mutations. The store commits
//! the group only if every check holds against the latest committed state,
//! and then applies every mutation under one new version. Otherwise nothing
//! is written.
//!
//! ```
//! use roster_core::{AtomicGroup, Key, Value};
//!
//! let key = Key::new("users", "1").unwrap();
//! let group = AtomicGroup::new()
//!     .check_absent(key.clone())
//!     .set(key, Value::from_bytes(b"alice".to_vec()));
//! assert_eq!(group.checks().len(), 1);
//! assert_eq!(group.mutations().len(), 1);
//! ```
//!
//! ## Semantics
//!
//! - A check with `expected: None` requires the key to be absent
//! - A check with `expected: Some(v)` requires the key's current version to be `v`
//! - Groups with no checks always commit (blind writes)
//! - When several mutations touch the same key, the last one wins
//! - An empty group still commits and consumes a version

use super::Version;
use crate::key::Key;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A precondition on one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Key to inspect
    pub key: Key,
    /// Required current version, `None` for "must not exist"
    pub expected: Option<Version>,
}

/// A write applied when the group commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Store `value` under `key`
    Set {
        /// Target key
        key: Key,
        /// New value
        value: Value,
    },
    /// Remove `key`; a no-op if it is already absent
    Delete {
        /// Target key
        key: Key,
    },
}

impl Mutation {
    /// The key this mutation touches
    pub fn key(&self) -> &Key {
        match self {
            Mutation::Set { key, .. } | Mutation::Delete { key } => key,
        }
    }

    /// Whether this mutation removes its key
    pub fn is_delete(&self) -> bool {
        matches!(self, Mutation::Delete { .. })
    }
}

/// Checks plus mutations, committed all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "an atomic group does nothing until it is committed"]
pub struct AtomicGroup {
    checks: Vec<Check>,
    mutations: Vec<Mutation>,
}

impl AtomicGroup {
    /// Start an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to be at `expected` (`None` = absent)
    pub fn check(mut self, key: Key, expected: Option<Version>) -> Self {
        self.checks.push(Check { key, expected });
        self
    }

    /// Require `key` to be absent
    pub fn check_absent(self, key: Key) -> Self {
        self.check(key, None)
    }

    /// Write `value` under `key`
    pub fn set(mut self, key: Key, value: Value) -> Self {
        self.mutations.push(Mutation::Set { key, value });
        self
    }

    /// Remove `key`
    pub fn delete(mut self, key: Key) -> Self {
        self.mutations.push(Mutation::Delete { key });
        self
    }

    /// Preconditions in insertion order
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Mutations in insertion order
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Whether the group has neither checks nor mutations
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty() && self.mutations.is_empty()
    }

    /// Split into checks and mutations
    pub fn into_parts(self) -> (Vec<Check>, Vec<Mutation>) {
        (self.checks, self.mutations)
    }
}
