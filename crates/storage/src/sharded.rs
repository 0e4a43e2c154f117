//! Sharded multi-version storage
//!
//! DashMap keyed by key space, FxHashMap within each space.
//!
//! # Design
//!
//! - DashMap: lock-striped, readers of different spaces never contend
//! - FxHashMap: O(1) lookups, fast non-crypto hash
//! - Per-space shards: the three user indices live in separate shards
//!
//! # Visibility
//!
//! Every entry carries the version of the commit that wrote it. A commit
//! first pushes all of its entries and only then publishes its version.
//! Readers load the published version once and read every key at that
//! version, so a group becomes visible all at once and a batched read never
//! mixes two commits.
//!
//! # Replica Watermark
//!
//! Eventual reads are served at the replica watermark, a version that lags
//! the published version until it is advanced. Version chains keep the
//! history needed by watermark readers; [`ShardedStore::gc`] prunes what no
//! reader can reach any more.
//!
//! A GC pass records its watermark as the GC floor before pruning. A batched
//! replica read whose version fell below the floor while it ran may have
//! seen pruned and unpruned chains side by side, so it is retried at the
//! newer watermark.

use dashmap::DashMap;
use roster_core::{Key, Timestamp, Value, Version, VersionedValue};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::stored_value::StoredValue;

/// Version chain for MVCC
///
/// Entries are stored newest first, so the common read (latest at or below
/// some version) stops at the first match.
#[derive(Debug, Clone)]
pub struct VersionChain {
    versions: VecDeque<StoredValue>,
    /// Versions older than this were pruned
    pruned_below: u64,
}

impl VersionChain {
    /// Create a chain holding one entry
    pub fn new(value: StoredValue) -> Self {
        let mut versions = VecDeque::with_capacity(2);
        versions.push_front(value);
        Self {
            versions,
            pruned_below: 0,
        }
    }

    /// Add a newer entry
    ///
    /// An entry with the same version as the newest replaces it, so the last
    /// mutation of a key within one commit wins.
    #[inline]
    pub fn push(&mut self, value: StoredValue) {
        match self.versions.front_mut() {
            Some(front) if front.version() == value.version() => *front = value,
            _ => {
                debug_assert!(
                    self.versions
                        .front()
                        .map_or(true, |f| f.version() < value.version()),
                    "version chain must grow newest-first"
                );
                self.versions.push_front(value);
            }
        }
    }

    /// Entry visible at `max_version`
    ///
    /// A reader older than the pruning point sees the oldest retained entry:
    /// the history it would need is gone, and that entry is the state every
    /// reader at the pruning point agrees on.
    pub fn get_at_version(&self, max_version: u64) -> Option<&StoredValue> {
        self.versions
            .iter()
            .find(|sv| sv.version().as_u64() <= max_version)
            .or_else(|| {
                if max_version < self.pruned_below {
                    self.versions.back()
                } else {
                    None
                }
            })
    }

    /// Newest entry regardless of publication
    #[inline]
    pub fn latest(&self) -> Option<&StoredValue> {
        self.versions.front()
    }

    /// Drop entries no reader at or above `watermark` can observe
    ///
    /// Keeps the newest entry at or below the watermark and everything newer.
    /// Returns the number of entries removed.
    pub fn gc(&mut self, watermark: u64) -> usize {
        let Some(keep) = self
            .versions
            .iter()
            .position(|sv| sv.version().as_u64() <= watermark)
        else {
            return 0;
        };
        let removed = self.versions.len() - keep - 1;
        if removed > 0 {
            self.versions.truncate(keep + 1);
            if let Some(oldest) = self.versions.back() {
                self.pruned_below = oldest.version().as_u64();
            }
        }
        removed
    }

    /// Whether the chain is a single deletion every reader already sees
    pub fn is_dead(&self, watermark: u64) -> bool {
        self.versions.len() == 1
            && self
                .versions
                .front()
                .map_or(true, |sv| sv.is_tombstone() && sv.version().as_u64() <= watermark)
    }

    /// Number of retained entries
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }
}

/// All keys of one space
#[derive(Debug, Default)]
pub struct Shard {
    pub(crate) data: FxHashMap<Key, VersionChain>,
}

impl Shard {
    /// Create an empty shard
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a chain (live or tombstoned)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the shard holds no chains
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Counters from one garbage collection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Superseded entries dropped from chains
    pub pruned_versions: usize,
    /// Keys whose chain was a settled deletion
    pub removed_keys: usize,
}

/// Sharded multi-version store
///
/// # Thread Safety
///
/// All methods take `&self`. Writers lock only the shard of the key space
/// they touch. Callers must serialize [`apply_batch`](Self::apply_batch)
/// calls; the commit manager does this with its commit lock.
pub struct ShardedStore {
    shards: DashMap<String, Shard>,
    /// Last published commit
    version: AtomicU64,
    /// Version served to eventual reads
    replica: AtomicU64,
    /// Highest watermark any GC pass has pruned at; never above `replica`
    gc_floor: AtomicU64,
}

impl ShardedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
            version: AtomicU64::new(0),
            replica: AtomicU64::new(0),
            gc_floor: AtomicU64::new(0),
        }
    }

    /// Last published commit version
    #[inline]
    pub fn version(&self) -> Version {
        Version::new(self.version.load(Ordering::Acquire))
    }

    /// Current replica watermark
    #[inline]
    pub fn replica_version(&self) -> Version {
        Version::new(self.replica.load(Ordering::Acquire))
    }

    /// Reset both published version and watermark (used during recovery)
    pub fn set_version(&self, version: Version) {
        self.version.store(version.as_u64(), Ordering::Release);
        self.replica.store(version.as_u64(), Ordering::Release);
    }

    /// Move the watermark forward to `target`, capped at the published version
    ///
    /// Never moves it backwards. Returns the resulting watermark.
    pub fn advance_replica(&self, target: Version) -> Version {
        let capped = target.as_u64().min(self.version.load(Ordering::Acquire));
        let previous = self.replica.fetch_max(capped, Ordering::AcqRel);
        Version::new(previous.max(capped))
    }

    /// Bring the watermark up to the published version
    pub fn catch_up_replica(&self) -> Version {
        self.advance_replica(self.version())
    }

    /// Number of key spaces with data
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of live keys at the published version
    pub fn total_entries(&self) -> usize {
        let at = self.version.load(Ordering::Acquire);
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .data
                    .values()
                    .filter(|chain| chain.get_at_version(at).is_some_and(|sv| !sv.is_tombstone()))
                    .count()
            })
            .sum()
    }

    /// Number of retained entries across all chains, tombstones included
    pub fn retained_versions(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.data.values().map(VersionChain::version_count).sum::<usize>())
            .sum()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read `key` at an explicit version
    pub fn get_at(&self, key: &Key, version: Version) -> Option<VersionedValue> {
        self.shards.get(key.space()).and_then(|shard| {
            shard
                .data
                .get(key)
                .and_then(|chain| chain.get_at_version(version.as_u64()))
                .and_then(StoredValue::to_versioned)
        })
    }

    /// Read `key` at the published version
    pub fn get(&self, key: &Key) -> Option<VersionedValue> {
        self.get_at(key, self.version())
    }

    /// Read `key` at the replica watermark
    pub fn get_replica(&self, key: &Key) -> Option<VersionedValue> {
        self.get_at(key, self.replica_version())
    }

    /// Read several keys at one version, preserving input order
    ///
    /// Consistent only while `version` is at or above the GC floor; use
    /// [`get_many_replica`](Self::get_many_replica) for watermark reads.
    pub fn get_many_at(&self, keys: &[Key], version: Version) -> Vec<Option<VersionedValue>> {
        keys.iter().map(|key| self.get_at(key, version)).collect()
    }

    /// Read several keys at the replica watermark as one snapshot
    ///
    /// Returns the version read at along with the values.
    pub fn get_many_replica(&self, keys: &[Key]) -> (Version, Vec<Option<VersionedValue>>) {
        loop {
            let at = self.replica_version();
            let values = self.get_many_at(keys, at);
            if self.gc_floor.load(Ordering::Acquire) <= at.as_u64() {
                return (at, values);
            }
        }
    }

    /// Watermark of the most recent GC pass
    pub fn gc_floor(&self) -> Version {
        Version::new(self.gc_floor.load(Ordering::Acquire))
    }

    /// Version of the newest entry for `key`, `None` if absent or deleted
    ///
    /// Sees entries that are applied but not yet published. Only the commit
    /// path, which holds the commit lock, should rely on this.
    pub fn current_version(&self, key: &Key) -> Option<Version> {
        self.shards.get(key.space()).and_then(|shard| {
            shard
                .data
                .get(key)
                .and_then(VersionChain::latest)
                .filter(|sv| !sv.is_tombstone())
                .map(StoredValue::version)
        })
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Apply one commit's writes and publish its version
    ///
    /// `None` values are deletions. All entries share `version` and
    /// `timestamp`. The version is published only after every entry is in
    /// place.
    pub fn apply_batch(&self, writes: &[(Key, Option<Value>)], version: Version, timestamp: Timestamp) {
        for (key, value) in writes {
            let stored = match value {
                Some(v) => StoredValue::live(v.clone(), version, timestamp),
                None => StoredValue::tombstone(version, timestamp),
            };
            let mut shard = self.shards.entry(key.space().to_string()).or_default();
            match shard.data.get_mut(key) {
                Some(chain) => chain.push(stored),
                None => {
                    // Deleting a key that never existed leaves nothing behind
                    if !stored.is_tombstone() {
                        shard.data.insert(key.clone(), VersionChain::new(stored));
                    }
                }
            }
        }
        self.version.fetch_max(version.as_u64(), Ordering::AcqRel);
    }

    // ========================================================================
    // Garbage Collection
    // ========================================================================

    /// Prune history older than the replica watermark
    pub fn gc(&self) -> GcStats {
        let watermark = self.replica.load(Ordering::Acquire);
        // Published before any chain is touched
        self.gc_floor.fetch_max(watermark, Ordering::AcqRel);
        let mut stats = GcStats::default();
        for mut shard in self.shards.iter_mut() {
            shard.data.retain(|_, chain| {
                stats.pruned_versions += chain.gc(watermark);
                if chain.is_dead(watermark) {
                    stats.removed_keys += 1;
                    false
                } else {
                    true
                }
            });
        }
        self.shards.retain(|_, shard| !shard.is_empty());
        stats
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("shard_count", &self.shard_count())
            .field("version", &self.version().as_u64())
            .field("replica", &self.replica_version().as_u64())
            .finish()
    }
}
