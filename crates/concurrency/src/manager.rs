//! Commit manager for atomic groups
//!
//! Provides all-or-nothing commit by running, under one commit lock:
//!
//! ```text
//! 1. validate_checks()   - every check against the latest committed state
//! 2. IF any failed:      return Rejected, nothing written
//! 3. allocate_version()  - published version + 1
//! 4. WAL append          - durability point (skipped in Cache mode)
//! 5. apply_batch()       - storage application, then publication
//! 6. return Committed { version }
//! ```
//!
//! If the process dies before step 4 completes the group never happened.
//! After step 4 it is replayed on the next open.
//!
//! Size limits are enforced before the lock is taken. Closing the manager
//! happens under the same lock, so a commit either lands in the log before
//! the final fsync or fails with `Closed`.

use std::sync::Arc;

use parking_lot::Mutex;
use roster_core::{
    AtomicGroup, CommitOutcome, Key, Limits, Mutation, RosterError, RosterResult, Timestamp, Value,
    Version,
};
use roster_durability::{WalCounters, WalRecord, WalWriter};
use roster_storage::ShardedStore;
use rustc_hash::FxHashMap;

use crate::validation::validate_checks;

/// Serializes commits against one store
///
/// Reads never go through the manager; they hit the store directly.
pub struct CommitManager {
    store: Arc<ShardedStore>,
    /// The commit lock; also owns the WAL writer
    log: Mutex<CommitLog>,
    limits: Limits,
}

/// State guarded by the commit lock
struct CommitLog {
    writer: Option<WalWriter>,
    closed: bool,
}

impl CommitManager {
    /// Create a manager over `store`
    ///
    /// `wal` is `None` for ephemeral databases.
    pub fn new(store: Arc<ShardedStore>, wal: Option<WalWriter>, limits: Limits) -> Self {
        CommitManager {
            store,
            log: Mutex::new(CommitLog {
                writer: wal,
                closed: false,
            }),
            limits,
        }
    }

    /// The store commits are applied to
    pub fn store(&self) -> &Arc<ShardedStore> {
        &self.store
    }

    /// Configured size limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Last published commit version
    pub fn current_version(&self) -> Version {
        self.store.version()
    }

    /// Commit an atomic group
    ///
    /// # Returns
    ///
    /// - `Ok(Committed { version })` when every check held
    /// - `Ok(Rejected(..))` listing every failed check
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if a key or value exceeds the limits
    /// - `Closed` after [`close`](Self::close)
    /// - `Serialization`/`Io` if the WAL append fails; nothing is applied
    pub fn commit(&self, group: AtomicGroup) -> RosterResult<CommitOutcome> {
        for mutation in group.mutations() {
            self.limits.validate_key(mutation.key())?;
            if let Mutation::Set { value, .. } = mutation {
                self.limits.validate_value(value)?;
            }
        }
        for check in group.checks() {
            self.limits.validate_key(&check.key)?;
        }

        let (checks, mutations) = group.into_parts();

        let mut log = self.log.lock();
        if log.closed {
            return Err(RosterError::Closed);
        }

        let validation = validate_checks(&self.store, &checks);
        if !validation.is_valid() {
            return Ok(CommitOutcome::Rejected(validation.into_rejection()));
        }

        let version = self.allocate_version();
        let timestamp = Timestamp::now();
        let writes = collapse(mutations);

        if let Some(writer) = log.writer.as_mut() {
            writer.append(&to_record(&writes, version, timestamp))?;
        }

        self.store.apply_batch(&writes, version, timestamp);
        Ok(CommitOutcome::Committed { version })
    }

    /// Next commit version; only meaningful under the commit lock
    fn allocate_version(&self) -> Version {
        self.store.version().next()
    }

    /// fsync the WAL now
    pub fn flush(&self) -> RosterResult<()> {
        if let Some(writer) = self.log.lock().writer.as_mut() {
            writer.sync()?;
        }
        Ok(())
    }

    /// fsync the WAL if its interval has elapsed; returns whether it synced
    pub fn sync_if_overdue(&self) -> RosterResult<bool> {
        match self.log.lock().writer.as_mut() {
            Some(writer) => Ok(writer.sync_if_overdue()?),
            None => Ok(false),
        }
    }

    /// WAL counters, if a WAL is attached
    pub fn wal_counters(&self) -> Option<WalCounters> {
        self.log.lock().writer.as_ref().map(WalWriter::counters)
    }

    /// Whether [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.log.lock().closed
    }

    /// Refuse further commits, then flush and detach the WAL
    ///
    /// Idempotent. The lock is held throughout, so no commit is acknowledged
    /// after the final fsync.
    pub fn close(&self) -> RosterResult<()> {
        let mut log = self.log.lock();
        log.closed = true;
        if let Some(mut writer) = log.writer.take() {
            writer.sync()?;
        }
        Ok(())
    }
}

/// Reduce mutations to one final write per key, in first-touch order
fn collapse(mutations: Vec<Mutation>) -> Vec<(Key, Option<Value>)> {
    let mut index: FxHashMap<Key, usize> = FxHashMap::default();
    let mut writes: Vec<(Key, Option<Value>)> = Vec::with_capacity(mutations.len());
    for mutation in mutations {
        let (key, value) = match mutation {
            Mutation::Set { key, value } => (key, Some(value)),
            Mutation::Delete { key } => (key, None),
        };
        match index.get(&key) {
            Some(&slot) => writes[slot].1 = value,
            None => {
                index.insert(key.clone(), writes.len());
                writes.push((key, value));
            }
        }
    }
    writes
}

fn to_record(writes: &[(Key, Option<Value>)], version: Version, timestamp: Timestamp) -> WalRecord {
    let mut record = WalRecord {
        version: version.as_u64(),
        timestamp: timestamp.as_micros(),
        writes: Vec::new(),
        deletes: Vec::new(),
    };
    for (key, value) in writes {
        match value {
            Some(v) => record.writes.push((key.clone(), v.clone())),
            None => record.deletes.push(key.clone()),
        }
    }
    record
}
