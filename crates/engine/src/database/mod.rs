//! Database struct and open/close logic
//!
//! This module provides the `Database` handle that orchestrates:
//! - Storage initialization
//! - WAL opening and automatic recovery on startup
//! - The commit path for atomic groups
//! - Background maintenance (replica watermark, GC, periodic fsync)
//!
//! `Database` is a cheap, cloneable handle. Clones share one instance, and
//! opening an already-open path returns another handle to that same instance.
//! A path whose instance was shut down opens fresh, even while old handles
//! to the closed instance are still alive.

pub mod builder;
pub mod config;
mod kv_store;
mod registry;

pub use builder::DatabaseBuilder;
pub use config::{ReplicationConfig, ReplicationMode, RosterConfig, CONFIG_FILE_NAME};
pub use registry::open_database_count;

use crate::background::{self, Maintenance, MaintenanceStats};
use crate::coordinator::{CommitCoordinator, CommitMetrics};
use parking_lot::Mutex;
use registry::OPEN_DATABASES;
use roster_concurrency::{RecoveryCoordinator, RecoveryStats};
use roster_core::{
    AtomicGroup, CommitOutcome, Consistency, Key, RosterError, RosterResult, Version,
    VersionedValue,
};
use roster_durability::{DurabilityMode, WalCounters, WalWriter, WAL_DIR_NAME, WAL_FILE_NAME};
use roster_storage::ShardedStore;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the exclusive lock file inside a data directory
pub const LOCK_FILE_NAME: &str = ".lock";

// ============================================================================
// Persistence Mode
// ============================================================================

/// Where data lives, orthogonal to `DurabilityMode`
///
/// | PersistenceMode | DurabilityMode | Behavior |
/// |-----------------|----------------|----------|
/// | Ephemeral | (ignored) | No files, data lost on drop |
/// | Disk | Cache | Config and lock file, no WAL |
/// | Disk | Standard | WAL with periodic fsync |
/// | Disk | Always | WAL with fsync per commit |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PersistenceMode {
    /// No disk files at all
    Ephemeral,
    /// Data directory on disk
    Disk,
}

// ============================================================================
// Database
// ============================================================================

/// Shared state behind every `Database` handle
pub(crate) struct DatabaseInner {
    /// Canonical data directory (empty for ephemeral databases)
    data_dir: PathBuf,
    persistence: PersistenceMode,
    config: RosterConfig,
    durability: DurabilityMode,
    coordinator: Arc<CommitCoordinator>,
    maintenance: Maintenance,
    /// Cleared by shutdown; every later operation fails with `Closed`
    accepting: AtomicBool,
    recovery: RecoveryStats,
    /// Exclusive lock held until shutdown or drop; None when ephemeral
    lock_file: Mutex<Option<File>>,
}

/// Handle to an open database
///
/// # Example
///
/// ```text
/// use roster_engine::Database;
/// use roster_core::{AtomicGroup, Consistency, Key, Value};
///
/// let db = Database::open("/path/to/data")?;
/// let key = Key::new("users", "42")?;
/// db.commit_group(AtomicGroup::new().check_absent(key.clone()).set(key.clone(), value))?;
/// let stored = db.read(&key, Consistency::Strong)?;
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Open database at given path with automatic recovery
    ///
    /// Reads `roster.toml` from the data directory, creating it with defaults
    /// if missing.
    ///
    /// # Flow
    ///
    /// 1. Create data directory if needed
    /// 2. Read or create `roster.toml`
    /// 3. Return the existing instance if this path is open and not shut down
    /// 4. Otherwise: take the lock file, replay the WAL, start maintenance
    pub fn open<P: AsRef<Path>>(path: P) -> RosterResult<Self> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        RosterConfig::write_default_if_missing(&config_path)?;
        let cfg = RosterConfig::from_file(&config_path)?;

        Self::open_disk(&data_dir, cfg)
    }

    /// Open database at the given path with an explicit configuration.
    ///
    /// The supplied config is written to `roster.toml` so that a later
    /// `Database::open()` picks up the same settings.
    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: RosterConfig) -> RosterResult<Self> {
        cfg.validate()?;

        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        cfg.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;

        Self::open_disk(&data_dir, cfg)
    }

    /// In-memory database with default settings
    ///
    /// Creates no files and is never registered: each call returns an
    /// independent instance whose data is lost on drop.
    pub fn ephemeral() -> RosterResult<Self> {
        Self::ephemeral_with_config(RosterConfig::default())
    }

    /// In-memory database with explicit replication and limits
    ///
    /// The durability setting is ignored; nothing is written to disk.
    pub fn ephemeral_with_config(cfg: RosterConfig) -> RosterResult<Self> {
        cfg.validate()?;
        let replication = cfg.replication_mode()?;

        let coordinator = Arc::new(CommitCoordinator::new(
            Arc::new(ShardedStore::new()),
            None,
            cfg.limits.clone(),
            replication,
        ));
        let maintenance = Maintenance::spawn(Arc::clone(&coordinator), cfg.maintenance_interval())?;

        debug!(
            target: "roster::db",
            replication = replication.as_str(),
            "opened ephemeral database"
        );

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                data_dir: PathBuf::new(),
                persistence: PersistenceMode::Ephemeral,
                config: cfg,
                durability: DurabilityMode::Cache,
                coordinator,
                maintenance,
                accepting: AtomicBool::new(true),
                recovery: RecoveryStats::default(),
                lock_file: Mutex::new(None),
            }),
        })
    }

    /// Fluent alternative to the constructors above
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    fn open_disk(data_dir: &Path, cfg: RosterConfig) -> RosterResult<Self> {
        let durability = cfg.durability_mode()?;
        let replication = cfg.replication_mode()?;

        let canonical_path = data_dir.canonicalize()?;

        // A shut-down instance found below; declared first so its drop, which
        // unregisters, runs after the registry guard is released
        let closed_instance;

        // Held for the whole open so two threads cannot both create an instance
        let mut registry = OPEN_DATABASES.lock();

        if let Some(inner) = registry.get(&canonical_path).and_then(|weak| weak.upgrade()) {
            if inner.accepting.load(Ordering::SeqCst) {
                info!(target: "roster::db", path = ?canonical_path, "returning existing database instance");
                return Ok(Self { inner });
            }
            debug!(target: "roster::db", path = ?canonical_path, "replacing shut-down instance");
            closed_instance = Some(inner);
        } else {
            closed_instance = None;
        }

        let lock_path = canonical_path.join(LOCK_FILE_NAME);
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| RosterError::storage(format!("failed to open lock file: {}", e)))?;
        fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
            RosterError::storage(format!(
                "database at '{}' is already in use by another process",
                canonical_path.display()
            ))
        })?;

        let wal_path = canonical_path.join(WAL_DIR_NAME).join(WAL_FILE_NAME);
        let result = RecoveryCoordinator::new(&wal_path).recover()?;

        info!(
            target: "roster::db",
            path = ?canonical_path,
            records_replayed = result.stats.records_replayed,
            writes_applied = result.stats.writes_applied,
            deletes_applied = result.stats.deletes_applied,
            final_version = result.stats.final_version,
            torn_tail = result.stats.torn_tail,
            "recovery complete"
        );

        let wal = if durability.requires_wal() {
            Some(WalWriter::open(&wal_path, durability)?)
        } else {
            warn!(
                target: "roster::db",
                path = ?canonical_path,
                "durability is \"cache\"; commits will not survive a restart"
            );
            None
        };

        let coordinator = Arc::new(CommitCoordinator::new(
            Arc::new(result.storage),
            wal,
            cfg.limits.clone(),
            replication,
        ));
        let maintenance = Maintenance::spawn(Arc::clone(&coordinator), cfg.maintenance_interval())?;

        let inner = Arc::new(DatabaseInner {
            data_dir: canonical_path.clone(),
            persistence: PersistenceMode::Disk,
            config: cfg,
            durability,
            coordinator,
            maintenance,
            accepting: AtomicBool::new(true),
            recovery: result.stats,
            lock_file: Mutex::new(Some(lock_file)),
        });

        registry.insert(canonical_path.clone(), Arc::downgrade(&inner));
        drop(registry);
        drop(closed_instance);

        info!(
            target: "roster::db",
            path = ?canonical_path,
            durability = durability.as_str(),
            replication = replication.as_str(),
            "database opened"
        );

        Ok(Self { inner })
    }

    // ========================================================================
    // Reads and commits
    // ========================================================================

    fn check_accepting(&self) -> RosterResult<()> {
        if !self.inner.accepting.load(Ordering::SeqCst) {
            return Err(RosterError::Closed);
        }
        Ok(())
    }

    fn store(&self) -> &Arc<ShardedStore> {
        self.inner.coordinator.store()
    }

    /// Point read at the given consistency
    ///
    /// Reads never block on commits or on the WAL.
    pub fn read(&self, key: &Key, consistency: Consistency) -> RosterResult<Option<VersionedValue>> {
        self.check_accepting()?;
        Ok(match consistency {
            Consistency::Strong => self.store().get(key),
            Consistency::Eventual => self.store().get_replica(key),
        })
    }

    /// Batched point read; one slot per key in input order
    ///
    /// All keys are read at one version, so the result never mixes two
    /// commits. Eventual reads retry if garbage collection prunes past
    /// their version mid-read.
    pub fn read_many(
        &self,
        keys: &[Key],
        consistency: Consistency,
    ) -> RosterResult<Vec<Option<VersionedValue>>> {
        self.check_accepting()?;
        Ok(match consistency {
            Consistency::Strong => self.store().get_many_at(keys, self.store().version()),
            Consistency::Eventual => self.store().get_many_replica(keys).1,
        })
    }

    /// Commit an atomic group on the calling thread
    ///
    /// May block on a WAL fsync. Async callers go through the `KvStore`
    /// implementation, which moves disk commits to the blocking pool.
    ///
    /// # Errors
    ///
    /// - `Closed` after [`shutdown`](Self::shutdown)
    /// - `InvalidInput` if a key or value exceeds the configured limits
    /// - `Io`/`Serialization` if the WAL append fails
    pub fn commit_group(&self, group: AtomicGroup) -> RosterResult<CommitOutcome> {
        self.check_accepting()?;
        self.inner.coordinator.commit(group)
    }

    // ========================================================================
    // Replication and maintenance
    // ========================================================================

    /// Bring eventual reads up to the latest commit; returns the watermark
    pub fn catch_up_replica(&self) -> Version {
        let watermark = self.store().catch_up_replica();
        debug!(target: "roster::replica", watermark = watermark.as_u64(), "replica caught up on request");
        watermark
    }

    /// Latest committed version
    pub fn current_version(&self) -> Version {
        self.inner.coordinator.current_version()
    }

    /// Version eventual reads currently observe
    pub fn replica_version(&self) -> Version {
        self.store().replica_version()
    }

    /// Run one maintenance pass now, on the calling thread
    pub fn run_maintenance(&self) {
        background::tick(&self.inner.coordinator, self.inner.maintenance.stats());
    }

    /// Counters from the maintenance thread
    pub fn maintenance_stats(&self) -> &MaintenanceStats {
        self.inner.maintenance.stats()
    }

    /// fsync the WAL now; a no-op without one
    pub fn flush(&self) -> RosterResult<()> {
        self.inner.coordinator.flush()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether the database has no files
    pub fn is_ephemeral(&self) -> bool {
        self.inner.persistence == PersistenceMode::Ephemeral
    }

    /// Whether the database still accepts operations
    pub fn is_open(&self) -> bool {
        self.inner.accepting.load(Ordering::SeqCst)
    }

    /// Canonical data directory (empty for ephemeral databases)
    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }

    /// Configuration the instance was opened with
    pub fn config(&self) -> &RosterConfig {
        &self.inner.config
    }

    /// Effective durability mode
    pub fn durability_mode(&self) -> DurabilityMode {
        self.inner.durability
    }

    /// Effective replication mode
    pub fn replication_mode(&self) -> ReplicationMode {
        self.inner.coordinator.replication()
    }

    /// Commit metrics
    pub fn metrics(&self) -> CommitMetrics {
        self.inner.coordinator.metrics()
    }

    /// What recovery did when this instance was opened
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.inner.recovery
    }

    /// WAL counters, if a WAL is attached
    pub fn wal_counters(&self) -> Option<WalCounters> {
        self.inner.coordinator.wal_counters()
    }

    /// Number of live keys at the latest version
    pub fn live_keys(&self) -> usize {
        self.store().total_entries()
    }

    /// Whether two handles refer to the same instance
    pub fn same_instance(&self, other: &Database) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Graceful shutdown
    ///
    /// Stops accepting operations, stops the maintenance thread, syncs the
    /// WAL and releases the lock file. Every later read or commit through
    /// any handle of this instance fails with `Closed`; opening the path
    /// again creates a new instance. Idempotent.
    pub fn shutdown(&self) -> RosterResult<()> {
        // Opens of this path wait until the instance has let go of it
        let _registry = match self.inner.persistence {
            PersistenceMode::Disk => Some(OPEN_DATABASES.lock()),
            PersistenceMode::Ephemeral => None,
        };
        if !self.inner.accepting.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.maintenance.stop();
        // Closing takes the commit lock, so an in-flight commit finishes
        // first and any later one fails with `Closed`
        let closed = self.inner.coordinator.close();
        drop(self.inner.lock_file.lock().take());
        closed?;
        info!(target: "roster::db", path = ?self.inner.data_dir, "database shut down");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.inner.data_dir)
            .field("persistence", &self.inner.persistence)
            .field("durability", &self.inner.durability.as_str())
            .field("version", &self.current_version().as_u64())
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        self.accepting.store(false, Ordering::SeqCst);
        self.maintenance.stop();

        if let Err(e) = self.coordinator.close() {
            warn!(target: "roster::db", error = %e, "final WAL sync failed");
        }

        // Release the lock before unregistering so a concurrent reopen can proceed
        drop(self.lock_file.get_mut().take());
        if self.persistence == PersistenceMode::Disk {
            registry::unregister(&self.data_dir);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
