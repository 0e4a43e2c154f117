//! Directory state across restarts

use crate::test_utils::*;
use roster::{Database, DatabaseBuilder, SessionRotation, UserDirectory};
use std::sync::Arc;

/// Test: created, rotated and signed-out state is recovered exactly
#[tokio::test]
async fn test_directory_survives_restart() {
    let t = TestDirectory::on_disk();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    let bob = t.create_user(user("2", "bob", "b1")).await.unwrap();
    let alice = t.set_user_session(&alice, "s2").await.unwrap();
    t.sign_out("s1").await.unwrap();
    t.delete_user(&bob).await.unwrap();

    let t = t.reopen();
    assert_eq!(t.db.recovery_stats().records_replayed, 5);

    assert_eq!(t.get_user_by_id("1").await.unwrap(), Some(alice.clone()));
    assert_eq!(t.get_user_by_login("alice").await.unwrap(), Some(alice.clone()));
    assert_eq!(t.get_user_by_session_id("s2").await.unwrap(), Some(alice));
    assert!(t.get_user_by_session_id("s1").await.unwrap().is_none());
    assert!(t.get_user_by_id("2").await.unwrap().is_none());
    assert!(t.get_user_by_session_id("b1").await.unwrap().is_none());
}

/// Test: uniqueness still holds against recovered entries
#[tokio::test]
async fn test_uniqueness_after_restart() {
    let t = TestDirectory::on_disk();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    let t = t.reopen();

    assert!(t.create_user(user("2", "alice", "s2")).await.unwrap_err().is_conflict());
    assert!(t.create_user(user("3", "carol", "s1")).await.unwrap_err().is_conflict());
}

/// Test: versions keep increasing across restarts, so stale checks still fail
#[tokio::test]
async fn test_rotation_after_restart_uses_fresh_versions() {
    let t = TestDirectory::on_disk();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    let before = t.db.current_version();
    let t = t.reopen();
    assert_eq!(t.db.current_version(), before);

    let rotated = t.set_user_session(&alice, "s2").await.unwrap();
    assert!(t.db.current_version() > before);
    assert_eq!(t.get_user_by_session_id("s2").await.unwrap(), Some(rotated));
}

/// Test: revoke policy works the same on an always-fsync database
#[tokio::test]
async fn test_revoke_on_always_durability() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = DatabaseBuilder::new().path(dir.path()).always().open().unwrap();
        let directory = UserDirectory::with_options(
            Arc::new(db.clone()),
            roster::DirectoryOptions::default().with_rotation(SessionRotation::RevokePrevious),
        );
        let alice = directory.create_user(user("1", "alice", "s1")).await.unwrap();
        directory.set_user_session(&alice, "s2").await.unwrap();
        drop(directory);
        db.shutdown().unwrap();
    }

    let db = Database::open(dir.path()).unwrap();
    let directory = UserDirectory::new(Arc::new(db.clone()));
    assert!(directory.get_user_by_session_id("s1").await.unwrap().is_none());
    assert_eq!(directory.get_user_by_session_id("s2").await.unwrap().unwrap().id, "1");
    assert_eq!(db.live_keys(), 3);
}
