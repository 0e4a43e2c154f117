//! Storage layer for Roster
//!
//! This crate implements the in-memory multi-version backend:
//! - ShardedStore: DashMap of per-space FxHashMap shards
//! - VersionChain: newest-first history per key, tombstones for deletes
//! - Published version plus replica watermark for strong and eventual reads
//! - Watermark-driven garbage collection
//!
//! Durability and commit validation live in `roster-durability` and
//! `roster-concurrency`; this crate only stores and serves versions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;
pub mod stored_value;

pub use sharded::{GcStats, Shard, ShardedStore, VersionChain};
pub use stored_value::StoredValue;
