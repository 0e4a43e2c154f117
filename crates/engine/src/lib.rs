//! Database engine for Roster
//!
//! This crate orchestrates all lower layers:
//! - Database: open/close lifecycle, config file, process-wide registry
//! - Commit coordination and metrics
//! - Recovery integration
//! - Background maintenance (replica watermark, GC, periodic fsync)
//!
//! `Database` implements [`roster_core::KvStore`], which is how the user
//! directory reaches it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod background;
pub mod coordinator;
pub mod database;

pub use background::MaintenanceStats;
pub use coordinator::{CommitCoordinator, CommitMetrics};
pub use database::{
    open_database_count, Database, DatabaseBuilder, ReplicationConfig, ReplicationMode,
    RosterConfig, CONFIG_FILE_NAME, LOCK_FILE_NAME,
};
pub use roster_durability::DurabilityMode;
