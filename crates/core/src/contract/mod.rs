//! Store contract types
//!
//! These types define what the backing store promises its callers:
//!
//! - Every read returns `Versioned<Value>` or nothing
//! - Every committed atomic group produces exactly one new `Version`
//! - An atomic group either applies all of its mutations or none of them
//!
//! ## Module Structure
//!
//! - `version`: Commit version identifiers
//! - `timestamp`: Microsecond timestamps
//! - `versioned`: Value plus version wrapper
//! - `atomic`: Conditional atomic groups (checks plus mutations)
//! - `commit`: Commit outcomes and rejection details

pub mod atomic;
pub mod commit;
pub mod timestamp;
pub mod version;
pub mod versioned;

pub use atomic::{AtomicGroup, Check, Mutation};
pub use commit::{CheckFailure, CommitOutcome, CommitRejection};
pub use timestamp::Timestamp;
pub use version::Version;
pub use versioned::{Versioned, VersionedValue};
