//! Core types and traits for Roster
//!
//! This crate defines the foundational types shared by every layer:
//! - Key: (keyspace, user key) pair addressing one stored entry
//! - Value: Opaque encoded payload
//! - Version / Versioned<T>: Revision markers returned with every read
//! - AtomicGroup: Checks + mutations committed as one unit
//! - CommitOutcome / CommitRejection: Result of committing a group
//! - Consistency: Strong vs eventual read level
//! - Limits: Key and value size limits
//! - Error: `RosterError` taxonomy
//! - Traits: The async `KvStore` contract the directory is built on

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod consistency;
pub mod contract;
pub mod error;
pub mod key;
pub mod limits;
pub mod traits;
pub mod value;

pub use consistency::Consistency;
pub use contract::{
    AtomicGroup, Check, CheckFailure, CommitOutcome, CommitRejection, Mutation, Timestamp,
    Version, Versioned, VersionedValue,
};
pub use error::{RosterError, RosterResult};
pub use key::{Key, KeyError};
pub use limits::{LimitError, Limits};
pub use traits::KvStore;
pub use value::Value;
