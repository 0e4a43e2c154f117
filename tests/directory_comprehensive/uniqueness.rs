//! Uniqueness: id, username and session token each have one owner

use crate::test_utils::*;
use roster::{Key, RosterError};

async fn assert_conflict_on(t: &TestDirectory, candidate: roster::User, space: &str, user_key: &str) {
    let err = t.create_user(candidate).await.unwrap_err();
    match &err {
        RosterError::Conflict { operation, rejection } => {
            assert_eq!(*operation, "create_user");
            assert!(rejection.involves(&Key::new(space, user_key).unwrap()));
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert!(err.is_retryable());
}

/// Test: duplicate id is rejected
#[tokio::test]
async fn test_duplicate_id() {
    let t = TestDirectory::new();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    assert_conflict_on(&t, user("1", "alicia", "s2"), "users", "1").await;
    assert!(t.get_user_by_login("alicia").await.unwrap().is_none());
}

/// Test: duplicate username is rejected
#[tokio::test]
async fn test_duplicate_username() {
    let t = TestDirectory::new();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    assert_conflict_on(&t, user("2", "alice", "s2"), "users_by_login", "alice").await;
    assert!(t.get_user_by_id("2").await.unwrap().is_none());
}

/// Test: duplicate session token is rejected
#[tokio::test]
async fn test_duplicate_session() {
    let t = TestDirectory::new();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    assert_conflict_on(&t, user("2", "bob", "s1"), "users_by_session", "s1").await;
    assert!(t.get_user_by_login("bob").await.unwrap().is_none());
}

/// Test: a rejected create writes nothing at all
#[tokio::test]
async fn test_rejected_create_is_invisible() {
    let t = TestDirectory::new();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
    let before = t.db.live_keys();

    let _ = t.create_user(user("2", "alice", "s2")).await.unwrap_err();
    assert_eq!(t.db.live_keys(), before);
    assert!(t.get_user_by_session_id("s2").await.unwrap().is_none());
}

/// Test: a deleted user's identifiers can be claimed again
#[tokio::test]
async fn test_identifiers_free_after_delete() {
    let t = TestDirectory::new();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    t.delete_user(&alice).await.unwrap();
    t.create_user(user("1", "alice", "s1")).await.unwrap();
}
