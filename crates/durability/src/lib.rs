//! Durability layer for Roster
//!
//! This crate handles everything that touches the log on disk:
//!
//! - WAL: one checksummed record per committed atomic group
//! - Durability modes: Cache, Standard (default), Always
//! - Reading the log back for recovery, including torn-tail detection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod wal;

pub use wal::{
    DurabilityMode, FrameError, ReadStopReason, WalCounters, WalReadOutcome, WalReader, WalRecord,
    WalWriter, WAL_DIR_NAME, WAL_FILE_NAME,
};

#[cfg(feature = "fault-injection")]
pub use wal::WalFault;
