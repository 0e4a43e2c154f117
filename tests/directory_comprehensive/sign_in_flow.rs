//! Sign-in flow: first sign-in creates, later ones rotate

use crate::test_utils::*;
use roster::{new_session_id, ExternalIdentity, RosterError};

fn identity() -> ExternalIdentity {
    ExternalIdentity {
        id: 1024,
        name: "Ada Lovelace".to_string(),
        login: "ada".to_string(),
        avatar_url: "https://avatars.example.com/1024".to_string(),
        email: Some("ada@example.com".to_string()),
    }
}

/// Test: sign in, sign in again, sign out
#[tokio::test]
async fn test_sign_in_lifecycle() {
    let t = TestDirectory::new();
    let first = new_session_id();
    let second = new_session_id();

    let created = t.sign_in(&identity(), &first).await.unwrap();
    assert_eq!(created.id, "1024");
    assert_eq!(created.username, "ada");
    assert_eq!(created.email.as_deref(), Some("ada@example.com"));

    let rotated = t.sign_in(&identity(), &second).await.unwrap();
    assert_eq!(rotated, created.with_session(second.clone()));
    assert_eq!(t.get_user_by_session_id(&second).await.unwrap(), Some(rotated));

    t.sign_out(&second).await.unwrap();
    assert!(t.get_user_by_session_id(&second).await.unwrap().is_none());
    assert!(t.get_user_by_id("1024").await.unwrap().is_some());
}

/// Test: a login already owned by another id blocks first sign-in
#[tokio::test]
async fn test_sign_in_with_taken_login() {
    let t = TestDirectory::new();
    t.create_user(user("7", "ada", "s7")).await.unwrap();

    let err = t.sign_in(&identity(), &new_session_id()).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(t.get_user_by_id("1024").await.unwrap().is_none());
}

/// Test: an empty token is rejected before touching the store
#[tokio::test]
async fn test_sign_in_with_empty_token() {
    let t = TestDirectory::new();
    let err = t.sign_in(&identity(), "").await.unwrap_err();
    assert!(matches!(err, RosterError::InvalidInput { .. }));
    assert_eq!(t.db.live_keys(), 0);
}
