//! Session rotation: all views move together, foreign tokens are refused

use crate::test_utils::*;
use roster::{SessionRotation, User};

/// Test: after rotation every view reports the new token
#[tokio::test]
async fn test_rotation_moves_every_view() {
    let t = TestDirectory::new();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    let rotated = t.set_user_session(&alice, "s2").await.unwrap();

    assert_eq!(rotated, alice.with_session("s2"));
    assert_eq!(t.get_user_by_id("1").await.unwrap(), Some(rotated.clone()));
    assert_eq!(t.get_user_by_login("alice").await.unwrap(), Some(rotated.clone()));
    assert_eq!(t.get_user_by_session_id("s2").await.unwrap(), Some(rotated));
}

/// Test: rotation writes the caller's profile fields
#[tokio::test]
async fn test_rotation_writes_caller_record() {
    let t = TestDirectory::new();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    let renamed = User {
        name: "Alice Liddell".to_string(),
        ..alice
    };
    t.set_user_session(&renamed, "s2").await.unwrap();
    assert_eq!(t.get_user_by_id("1").await.unwrap().unwrap().name, "Alice Liddell");
}

/// Test: rotating into another user's token leaves both users unchanged
#[tokio::test]
async fn test_foreign_token_rejected() {
    for rotation in [SessionRotation::RetainPrevious, SessionRotation::RevokePrevious] {
        let t = TestDirectory::with_rotation(rotation);
        let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
        let bob = t.create_user(user("2", "bob", "s2")).await.unwrap();

        let err = t.set_user_session(&alice, "s2").await.unwrap_err();
        assert!(err.is_conflict(), "{:?}", rotation);

        assert_eq!(t.get_user_by_id("1").await.unwrap(), Some(alice.clone()));
        assert_eq!(t.get_user_by_session_id("s1").await.unwrap(), Some(alice));
        assert_eq!(t.get_user_by_login("bob").await.unwrap(), Some(bob.clone()));
        assert_eq!(t.get_user_by_session_id("s2").await.unwrap(), Some(bob));
    }
}

/// Test: rotating to the token already held is a conflict, not a no-op
#[tokio::test]
async fn test_rotation_to_own_token_conflicts() {
    let t = TestDirectory::new();
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    assert!(t.set_user_session(&alice, "s1").await.unwrap_err().is_conflict());
}

/// Test: rotation of a user that was never created is an integrity violation
#[tokio::test]
async fn test_rotation_of_unknown_user() {
    let t = TestDirectory::new();
    let err = t
        .set_user_session(&user("7", "ghost", "s1"), "s2")
        .await
        .unwrap_err();
    assert!(err.is_integrity_violation());
    assert!(t.get_user_by_session_id("s2").await.unwrap().is_none());
}

/// Test: retained previous token keeps resolving to the old record
#[tokio::test]
async fn test_retained_token_is_stale_not_foreign() {
    let t = TestDirectory::with_rotation(SessionRotation::RetainPrevious);
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    t.set_user_session(&alice, "s2").await.unwrap();

    assert_eq!(t.get_user_by_session_id("s1").await.unwrap(), Some(alice));
    t.sign_out("s1").await.unwrap();
    assert!(t.get_user_by_session_id("s1").await.unwrap().is_none());
    assert_eq!(t.get_user_by_session_id("s2").await.unwrap().unwrap().id, "1");
}

/// Test: revoked previous token no longer resolves
#[tokio::test]
async fn test_revoked_token_is_gone() {
    let t = TestDirectory::with_rotation(SessionRotation::RevokePrevious);
    let alice = t.create_user(user("1", "alice", "s1")).await.unwrap();
    let rotated = t.set_user_session(&alice, "s2").await.unwrap();
    t.set_user_session(&rotated, "s3").await.unwrap();

    assert!(t.get_user_by_session_id("s1").await.unwrap().is_none());
    assert!(t.get_user_by_session_id("s2").await.unwrap().is_none());
    assert_eq!(t.db.live_keys(), 3);
}
