//! Commit outcomes
//!
//! A commit either succeeds with the version stamped on every mutated entry
//! or is rejected with the list of checks that did not hold.

use super::Version;
use crate::error::{RosterError, RosterResult};
use crate::key::Key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One check that did not hold at commit time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Checked key
    pub key: Key,
    /// Version the group required (`None` = absent)
    pub expected: Option<Version>,
    /// Version actually found (`None` = absent)
    pub actual: Option<Version>,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(v: Option<Version>) -> String {
            match v {
                Some(v) => format!("v{}", v.as_u64()),
                None => "absent".to_string(),
            }
        }
        write!(
            f,
            "{} (expected {}, found {})",
            self.key,
            show(self.expected),
            show(self.actual)
        )
    }
}

/// Details of a rejected commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRejection {
    failures: Vec<CheckFailure>,
}

impl CommitRejection {
    /// Build a rejection from failed checks
    pub fn new(failures: Vec<CheckFailure>) -> Self {
        CommitRejection { failures }
    }

    /// Checks that did not hold
    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    /// Whether `key` is among the failed checks
    pub fn involves(&self, key: &Key) -> bool {
        self.failures.iter().any(|f| &f.key == key)
    }
}

impl fmt::Display for CommitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} check(s) failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { ", " })?;
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Result of committing an atomic group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// All checks held; mutations applied at `version`
    Committed {
        /// Version stamped on every mutated entry
        version: Version,
    },
    /// At least one check failed; nothing was written
    Rejected(CommitRejection),
}

impl CommitOutcome {
    /// Whether the group was applied
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }

    /// The commit version, if applied
    pub fn version(&self) -> Option<Version> {
        match self {
            CommitOutcome::Committed { version } => Some(*version),
            CommitOutcome::Rejected(_) => None,
        }
    }

    /// Convert a rejection into [`RosterError::Conflict`] tagged with `operation`
    pub fn into_result(self, operation: &'static str) -> RosterResult<Version> {
        match self {
            CommitOutcome::Committed { version } => Ok(version),
            CommitOutcome::Rejected(rejection) => Err(RosterError::conflict(operation, rejection)),
        }
    }
}
