//! The store contract
//!
//! `KvStore` is the seam between the directory and whatever holds its data.
//! The engine's `Database` implements it; tests may supply their own.
//!
//! Implementations must be safe to share across tasks (`Send + Sync`) and
//! must not block the async runtime for disk I/O.

use std::sync::Arc;

use async_trait::async_trait;

use crate::consistency::Consistency;
use crate::contract::{AtomicGroup, CommitOutcome, VersionedValue};
use crate::error::RosterResult;
use crate::key::Key;

/// Async transactional key-value store
///
/// # Guarantees
///
/// - A strong read reflects every commit that completed before it started
/// - An eventual read returns some committed value (or absence) no newer
///   than the latest commit, and never a partially applied group
/// - `commit` applies all mutations of a group or none of them
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Point read
    ///
    /// Returns `Ok(None)` when the key is absent at the requested consistency.
    async fn get(&self, key: &Key, consistency: Consistency) -> RosterResult<Option<VersionedValue>>;

    /// Batched point read
    ///
    /// The result has one slot per input key, in input order. Duplicate keys
    /// yield duplicate slots.
    async fn get_many(
        &self,
        keys: &[Key],
        consistency: Consistency,
    ) -> RosterResult<Vec<Option<VersionedValue>>>;

    /// Commit an atomic group
    ///
    /// A rejected group is `Ok(CommitOutcome::Rejected(..))`, not an error.
    /// Errors are reserved for infrastructure failures.
    async fn commit(&self, group: AtomicGroup) -> RosterResult<CommitOutcome>;

    /// Unconditionally remove a key
    ///
    /// Succeeds whether or not the key exists.
    async fn delete(&self, key: &Key) -> RosterResult<()> {
        self.commit(AtomicGroup::new().delete(key.clone())).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    async fn get(&self, key: &Key, consistency: Consistency) -> RosterResult<Option<VersionedValue>> {
        (**self).get(key, consistency).await
    }

    async fn get_many(
        &self,
        keys: &[Key],
        consistency: Consistency,
    ) -> RosterResult<Vec<Option<VersionedValue>>> {
        (**self).get_many(keys, consistency).await
    }

    async fn commit(&self, group: AtomicGroup) -> RosterResult<CommitOutcome> {
        (**self).commit(group).await
    }

    async fn delete(&self, key: &Key) -> RosterResult<()> {
        (**self).delete(key).await
    }
}
