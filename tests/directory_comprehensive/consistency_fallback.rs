//! Consistency fallback: session lookups never miss a committed session

use crate::test_utils::*;
use roster::{Consistency, Key};

fn session(token: &str) -> Key {
    Key::new("users_by_session", token).unwrap()
}

/// Test: lookup right after create succeeds while the replica lags
#[tokio::test]
async fn test_lookup_after_create_with_lagging_replica() {
    let t = TestDirectory::manual_replication();
    t.create_user(user("1", "alice", "s1")).await.unwrap();

    assert!(t.db.replica_version() < t.db.current_version());
    assert!(t.db.read(&session("s1"), Consistency::Eventual).unwrap().is_none());
    assert_eq!(t.get_user_by_session_id("s1").await.unwrap().unwrap().id, "1");
}

/// Test: lookup right after rotation succeeds while the replica lags
#[tokio::test]
async fn test_lookup_after_rotation_with_lagging_replica() {
    let t = TestDirectory::manual_replication();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    t.db.catch_up_replica();
    t.set_user_session(&alice, "s2").await.unwrap();

    let found = t.get_user_by_session_id("s2").await.unwrap().unwrap();
    assert_eq!(found.session_id, "s2");
}

/// Test: a lagging replica may still serve a signed-out session
#[tokio::test]
async fn test_signed_out_session_visible_until_replica_catches_up() {
    let t = TestDirectory::manual_replication();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    t.db.catch_up_replica();
    t.sign_out("s1").await.unwrap();

    // Eventual hit, documented staleness
    assert!(t.get_user_by_session_id("s1").await.unwrap().is_some());
    t.db.catch_up_replica();
    assert!(t.get_user_by_session_id("s1").await.unwrap().is_none());
}

/// Test: periodic replication converges without help
#[tokio::test]
async fn test_periodic_replication_converges() {
    let t = TestDirectory::new();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    let target = t.db.current_version();

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while t.db.replica_version() < target {
        assert!(std::time::Instant::now() < deadline, "replica never caught up");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(t.db.read(&session("s1"), Consistency::Eventual).unwrap().is_some());
}
