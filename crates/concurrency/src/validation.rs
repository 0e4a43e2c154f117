//! Check validation for atomic groups
//!
//! Rules:
//! - A check holds when the key's current version equals the expected one
//! - `expected: None` holds only when the key is absent (never written, or deleted)
//! - Every check is evaluated; a rejection reports all failures, not just the first
//! - Mutations are never validated; blind writes always pass

use roster_core::{Check, CheckFailure, CommitRejection};
use roster_storage::ShardedStore;

/// Accumulated check failures
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Checks that did not hold
    pub failures: Vec<CheckFailure>,
}

impl ValidationResult {
    /// A passing result
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether every check held
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed checks
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.failures.extend(other.failures);
    }

    /// Convert into the rejection reported to the caller
    pub fn into_rejection(self) -> CommitRejection {
        CommitRejection::new(self.failures)
    }
}

/// Evaluate every check against the latest committed state
///
/// Must run under the commit lock so that nothing commits between
/// validation and application.
pub fn validate_checks(store: &ShardedStore, checks: &[Check]) -> ValidationResult {
    let mut result = ValidationResult::ok();
    for check in checks {
        let actual = store.current_version(&check.key);
        if actual != check.expected {
            result.failures.push(CheckFailure {
                key: check.key.clone(),
                expected: check.expected,
                actual,
            });
        }
    }
    result
}
