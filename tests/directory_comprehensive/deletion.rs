//! Deletion: all three entries go together; session-only deletion is narrow

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use roster::{
    AtomicGroup, CommitOutcome, Consistency, Database, Key, KvStore, RosterResult, User,
    UserDirectory, Value, VersionedValue,
};

use crate::test_utils::*;

/// Test: delete removes every view
#[tokio::test]
async fn test_delete_removes_every_view() {
    let t = TestDirectory::new();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    t.delete_user(&alice).await.unwrap();

    assert!(t.get_user_by_id("1").await.unwrap().is_none());
    assert!(t.get_user_by_login("alice").await.unwrap().is_none());
    assert!(t.get_user_by_session_id("s1").await.unwrap().is_none());
    assert_eq!(t.db.live_keys(), 0);
}

/// Store that commits one extra group just before the next caller commit
struct Interposer {
    inner: Database,
    pending: Mutex<Option<AtomicGroup>>,
}

#[async_trait]
impl KvStore for Interposer {
    async fn get(&self, key: &Key, consistency: Consistency) -> RosterResult<Option<VersionedValue>> {
        self.inner.get(key, consistency).await
    }

    async fn get_many(
        &self,
        keys: &[Key],
        consistency: Consistency,
    ) -> RosterResult<Vec<Option<VersionedValue>>> {
        self.inner.get_many(keys, consistency).await
    }

    async fn commit(&self, group: AtomicGroup) -> RosterResult<CommitOutcome> {
        let interloper = self.pending.lock().unwrap().take();
        if let Some(interloper) = interloper {
            self.inner.commit(interloper).await?;
        }
        self.inner.commit(group).await
    }
}

/// Test: a change between read and commit aborts the delete entirely
#[tokio::test]
async fn test_concurrent_change_aborts_delete() {
    let t = TestDirectory::new();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();

    let renamed = User {
        name: "Changed Meanwhile".to_string(),
        ..alice.clone()
    };
    let interposer = Interposer {
        inner: t.db.clone(),
        pending: Mutex::new(Some(AtomicGroup::new().set(
            Key::new("users_by_login", "alice").unwrap(),
            Value::encode(&renamed).unwrap(),
        ))),
    };
    let racing = UserDirectory::new(Arc::new(interposer));

    let err = racing.delete_user(&alice).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(err
        .rejection()
        .unwrap()
        .involves(&Key::new("users_by_login", "alice").unwrap()));

    assert_eq!(t.get_user_by_id("1").await.unwrap(), Some(alice.clone()));
    assert_eq!(t.get_user_by_login("alice").await.unwrap(), Some(renamed));
    assert_eq!(t.get_user_by_session_id("s1").await.unwrap(), Some(alice));
}

/// Test: deleting an already-deleted user succeeds and changes nothing
#[tokio::test]
async fn test_delete_absent_user_is_noop() {
    let t = TestDirectory::new();
    let alice = user("1", "alice", "s1");
    t.delete_user(&alice).await.unwrap();
    assert_eq!(t.db.live_keys(), 0);
}

/// Test: deletion keyed on a retained token leaves the current token behind
#[tokio::test]
async fn test_delete_with_stale_record_uses_its_token() {
    let t = TestDirectory::new();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    t.set_user_session(&alice, "s2").await.unwrap();

    t.delete_user(&alice).await.unwrap();
    assert!(t.get_user_by_id("1").await.unwrap().is_none());
    assert!(t.get_user_by_session_id("s1").await.unwrap().is_none());
    // The caller's record named s1, so the s2 entry survives
    assert_eq!(t.get_user_by_session_id("s2").await.unwrap().unwrap().id, "1");
}

/// Test: session-only deletion keeps the by-id and by-login entries
#[tokio::test]
async fn test_session_only_deletion() {
    let t = TestDirectory::new();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    t.delete_user_by_session("s1").await.unwrap();

    assert!(t.get_user_by_session_id("s1").await.unwrap().is_none());
    let by_id = t.get_user_by_id("1").await.unwrap().unwrap();
    let by_login = t.get_user_by_login("alice").await.unwrap().unwrap();
    assert_eq!(by_id.session_id, "s1");
    assert_eq!(by_id, by_login);
}

/// Test: session-only deletion of an unknown token succeeds
#[tokio::test]
async fn test_session_only_deletion_of_unknown_token() {
    let t = TestDirectory::new();
    t.delete_user_by_session("never-issued").await.unwrap();
}
