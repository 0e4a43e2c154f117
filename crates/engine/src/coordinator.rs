//! Commit coordinator
//!
//! Wraps the [`CommitManager`] and adds:
//! - Commit metrics (committed, rejected, failed)
//! - Commit logging under the `roster::txn` target
//! - Replica advancement for synchronous replication

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use roster_concurrency::CommitManager;
use roster_core::{AtomicGroup, CommitOutcome, Limits, RosterResult, Version};
use roster_durability::{WalCounters, WalWriter};
use roster_storage::ShardedStore;
use tracing::{debug, warn};

use crate::database::ReplicationMode;

/// Commit coordinator for the database
///
/// The metric counters use Relaxed ordering. They are observational only and
/// synchronize nothing else.
pub struct CommitCoordinator {
    manager: CommitManager,
    replication: ReplicationMode,
    total_committed: AtomicU64,
    total_rejected: AtomicU64,
    total_failed: AtomicU64,
}

impl CommitCoordinator {
    /// Create a coordinator over `store`
    pub fn new(
        store: Arc<ShardedStore>,
        wal: Option<WalWriter>,
        limits: Limits,
        replication: ReplicationMode,
    ) -> Self {
        Self {
            manager: CommitManager::new(store, wal, limits),
            replication,
            total_committed: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        }
    }

    /// Commit an atomic group and record the result
    pub fn commit(&self, group: AtomicGroup) -> RosterResult<CommitOutcome> {
        let checks = group.checks().len();
        let mutations = group.mutations().len();

        match self.manager.commit(group) {
            Ok(CommitOutcome::Committed { version }) => {
                self.total_committed.fetch_add(1, Ordering::Relaxed);
                if self.replication == ReplicationMode::Synchronous {
                    self.manager.store().catch_up_replica();
                }
                debug!(
                    target: "roster::txn",
                    version = version.as_u64(),
                    checks,
                    mutations,
                    "group committed"
                );
                Ok(CommitOutcome::Committed { version })
            }
            Ok(CommitOutcome::Rejected(rejection)) => {
                self.total_rejected.fetch_add(1, Ordering::Relaxed);
                debug!(
                    target: "roster::txn",
                    failed_checks = rejection.failures().len(),
                    "group rejected"
                );
                Ok(CommitOutcome::Rejected(rejection))
            }
            Err(e) => {
                self.total_failed.fetch_add(1, Ordering::Relaxed);
                warn!(target: "roster::txn", error = %e, "commit failed");
                Err(e)
            }
        }
    }

    /// Store commits are applied to
    pub fn store(&self) -> &Arc<ShardedStore> {
        self.manager.store()
    }

    /// Configured replication mode
    pub fn replication(&self) -> ReplicationMode {
        self.replication
    }

    /// Last published commit version
    pub fn current_version(&self) -> Version {
        self.manager.current_version()
    }

    /// fsync the WAL now
    pub fn flush(&self) -> RosterResult<()> {
        self.manager.flush()
    }

    /// fsync the WAL if its interval has elapsed
    pub fn sync_if_overdue(&self) -> RosterResult<bool> {
        self.manager.sync_if_overdue()
    }

    /// WAL counters, if a WAL is attached
    pub fn wal_counters(&self) -> Option<WalCounters> {
        self.manager.wal_counters()
    }

    /// Refuse further commits, then flush and detach the WAL
    pub fn close(&self) -> RosterResult<()> {
        self.manager.close()
    }

    /// Snapshot of commit metrics
    pub fn metrics(&self) -> CommitMetrics {
        CommitMetrics {
            total_committed: self.total_committed.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            current_version: self.current_version().as_u64(),
            replica_version: self.store().replica_version().as_u64(),
        }
    }
}

/// Commit metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitMetrics {
    /// Groups that committed
    pub total_committed: u64,
    /// Groups rejected by a failed check
    pub total_rejected: u64,
    /// Commits that failed with an error (limits, WAL I/O)
    pub total_failed: u64,
    /// Last published commit version
    pub current_version: u64,
    /// Replica watermark served to eventual reads
    pub replica_version: u64,
}

impl CommitMetrics {
    /// Every commit attempt, whatever its result
    pub fn total_attempted(&self) -> u64 {
        self.total_committed + self.total_rejected + self.total_failed
    }

    /// How many versions eventual reads trail strong reads by
    pub fn replica_lag(&self) -> u64 {
        self.current_version.saturating_sub(self.replica_version)
    }

    /// Rejected / attempted
    pub fn rejection_rate(&self) -> f64 {
        let attempted = self.total_attempted();
        if attempted > 0 {
            self.total_rejected as f64 / attempted as f64
        } else {
            0.0
        }
    }
}
