//! WAL replay on open
//!
//! Replay applies commit decisions; it never re-runs validation.
//!
//! ## Procedure
//!
//! 1. Read every frame of the WAL in order
//! 2. Truncate a torn tail left by a crash mid-append
//! 3. Apply each record at its original version and timestamp
//! 4. Restore the version counter and replica watermark to the last version
//! 5. Collapse history that no reader can observe

use std::path::PathBuf;

use roster_core::{Key, RosterResult, Timestamp, Value, Version};
use roster_durability::{ReadStopReason, WalReader};
use roster_storage::ShardedStore;
use tracing::{info, warn};

/// Rebuilds a store from its WAL
pub struct RecoveryCoordinator {
    wal_path: PathBuf,
}

impl RecoveryCoordinator {
    /// Recover from the log at `wal_path`
    pub fn new(wal_path: impl Into<PathBuf>) -> Self {
        RecoveryCoordinator {
            wal_path: wal_path.into(),
        }
    }

    /// Replay the WAL into a fresh store
    ///
    /// # Errors
    ///
    /// `Corruption` if the log is damaged anywhere but its final frame.
    pub fn recover(&self) -> RosterResult<RecoveryResult> {
        let outcome = WalReader::read_all(&self.wal_path)?;
        let mut stats = RecoveryStats::default();

        if outcome.has_torn_tail() {
            stats.truncated_bytes = outcome.file_len - outcome.valid_end;
            warn!(
                target: "roster::db",
                reason = ?outcome.stop,
                bytes = stats.truncated_bytes,
                "discarding incomplete WAL tail"
            );
            WalReader::truncate(&self.wal_path, outcome.valid_end)?;
        }
        stats.torn_tail = outcome.stop != ReadStopReason::EndOfData;

        let storage = ShardedStore::new();
        for record in outcome.records {
            stats.writes_applied += record.writes.len();
            stats.deletes_applied += record.deletes.len();

            let mut batch: Vec<(Key, Option<Value>)> = Vec::with_capacity(record.mutation_count());
            batch.extend(record.writes.into_iter().map(|(k, v)| (k, Some(v))));
            batch.extend(record.deletes.into_iter().map(|k| (k, None)));

            storage.apply_batch(
                &batch,
                Version::new(record.version),
                Timestamp::from_micros(record.timestamp),
            );
            stats.records_replayed += 1;
            stats.final_version = record.version;
        }

        storage.set_version(Version::new(stats.final_version));
        storage.gc();

        info!(
            target: "roster::db",
            records = stats.records_replayed,
            final_version = stats.final_version,
            "WAL replay complete"
        );

        Ok(RecoveryResult { storage, stats })
    }
}

/// Recovered store plus what happened
#[derive(Debug)]
pub struct RecoveryResult {
    /// Store with every durable commit applied
    pub storage: ShardedStore,
    /// Replay statistics
    pub stats: RecoveryStats,
}

/// Statistics from recovery
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Committed groups replayed
    pub records_replayed: usize,
    /// Set mutations applied
    pub writes_applied: usize,
    /// Delete mutations applied
    pub deletes_applied: usize,
    /// Highest version in the log
    pub final_version: u64,
    /// Whether the log ended in a damaged frame
    pub torn_tail: bool,
    /// Bytes cut from the end of the log
    pub truncated_bytes: u64,
}

impl RecoveryStats {
    /// Writes plus deletes
    pub fn total_operations(&self) -> usize {
        self.writes_applied + self.deletes_applied
    }
}
