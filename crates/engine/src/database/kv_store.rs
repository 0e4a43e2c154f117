//! `KvStore` implementation
//!
//! Reads are served inline: they touch memory only. Disk-backed commits may
//! fsync, so they run on tokio's blocking pool; ephemeral commits run inline.

use async_trait::async_trait;
use roster_core::{
    AtomicGroup, CommitOutcome, Consistency, Key, KvStore, RosterError, RosterResult,
    VersionedValue,
};

use super::Database;

#[async_trait]
impl KvStore for Database {
    async fn get(&self, key: &Key, consistency: Consistency) -> RosterResult<Option<VersionedValue>> {
        self.read(key, consistency)
    }

    async fn get_many(
        &self,
        keys: &[Key],
        consistency: Consistency,
    ) -> RosterResult<Vec<Option<VersionedValue>>> {
        self.read_many(keys, consistency)
    }

    async fn commit(&self, group: AtomicGroup) -> RosterResult<CommitOutcome> {
        if self.is_ephemeral() || !self.durability_mode().requires_wal() {
            return self.commit_group(group);
        }
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.commit_group(group))
            .await
            .map_err(|e| RosterError::storage(format!("commit task failed: {}", e)))?
    }
}
