//! Background maintenance thread
//!
//! One thread per open database. Every tick it:
//! 1. Catches the replica watermark up (periodic replication only)
//! 2. Prunes history no reader can observe any more
//! 3. fsyncs the WAL if the durability interval has elapsed
//!
//! The thread holds the coordinator, never the database itself, so dropping
//! the last database handle is what stops it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use roster_core::{RosterError, RosterResult};
use tracing::{debug, trace, warn};

use crate::coordinator::CommitCoordinator;
use crate::database::ReplicationMode;

/// Counters reported by the maintenance thread
#[derive(Debug, Default)]
pub struct MaintenanceStats {
    ticks: AtomicU64,
    pruned_versions: AtomicU64,
    removed_keys: AtomicU64,
}

impl MaintenanceStats {
    /// Completed ticks
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Superseded versions dropped by GC
    pub fn pruned_versions(&self) -> u64 {
        self.pruned_versions.load(Ordering::Relaxed)
    }

    /// Settled deletions dropped by GC
    pub fn removed_keys(&self) -> u64 {
        self.removed_keys.load(Ordering::Relaxed)
    }
}

/// Handle to a running maintenance thread
pub(crate) struct Maintenance {
    shutdown: Arc<AtomicBool>,
    stats: Arc<MaintenanceStats>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Maintenance {
    /// Spawn the thread
    pub(crate) fn spawn(coordinator: Arc<CommitCoordinator>, interval: Duration) -> RosterResult<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(MaintenanceStats::default());

        let thread_shutdown = Arc::clone(&shutdown);
        let thread_stats = Arc::clone(&stats);
        let handle = std::thread::Builder::new()
            .name("roster-maintenance".to_string())
            .spawn(move || {
                while !thread_shutdown.load(Ordering::Acquire) {
                    std::thread::park_timeout(interval);
                    if thread_shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    tick(&coordinator, &thread_stats);
                }
            })
            .map_err(|e| {
                RosterError::storage(format!("failed to spawn maintenance thread: {}", e))
            })?;

        Ok(Self {
            shutdown,
            stats,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Counters shared with the thread
    pub(crate) fn stats(&self) -> &MaintenanceStats {
        &self.stats
    }

    /// Signal the thread and wait for it to exit; idempotent
    pub(crate) fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.lock().take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for Maintenance {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One maintenance pass
pub(crate) fn tick(coordinator: &CommitCoordinator, stats: &MaintenanceStats) {
    let store = coordinator.store();

    if let ReplicationMode::Periodic { .. } = coordinator.replication() {
        let watermark = store.catch_up_replica();
        trace!(target: "roster::replica", watermark = watermark.as_u64(), "replica caught up");
    }

    let gc = store.gc();
    if gc.pruned_versions > 0 || gc.removed_keys > 0 {
        stats
            .pruned_versions
            .fetch_add(gc.pruned_versions as u64, Ordering::Relaxed);
        stats
            .removed_keys
            .fetch_add(gc.removed_keys as u64, Ordering::Relaxed);
        debug!(
            target: "roster::replica",
            pruned_versions = gc.pruned_versions,
            removed_keys = gc.removed_keys,
            "pruned history below watermark"
        );
    }

    if let Err(e) = coordinator.sync_if_overdue() {
        warn!(target: "roster::wal", error = %e, "periodic WAL sync failed");
    }

    stats.ticks.fetch_add(1, Ordering::Relaxed);
}
