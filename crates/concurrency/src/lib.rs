//! Concurrency layer for Roster
//!
//! This crate turns atomic groups into commits:
//! - Check validation against the latest committed state
//! - CommitManager: commit lock, version allocation, WAL append, apply
//! - RecoveryCoordinator: WAL replay into a fresh store on open
//!
//! Conflicts are not errors here. A group whose checks fail is reported as
//! `CommitOutcome::Rejected` and callers decide what that means.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod recovery;
pub mod validation;

pub use manager::CommitManager;
pub use recovery::{RecoveryCoordinator, RecoveryResult, RecoveryStats};
pub use validation::{validate_checks, ValidationResult};
