//! Round trip: every view returns the record that was created

use crate::test_utils::*;
use roster::{User, UserKeys};

/// Test: create then read back through all three lookups
#[tokio::test]
async fn test_create_then_read_every_view() {
    let t = TestDirectory::new();
    let alice = user("1", "alice", "s1");
    t.create_user(alice.clone()).await.unwrap();

    assert_eq!(t.get_user_by_id("1").await.unwrap(), Some(alice.clone()));
    assert_eq!(t.get_user_by_login("alice").await.unwrap(), Some(alice.clone()));
    assert_eq!(t.get_user_by_session_id("s1").await.unwrap(), Some(alice));
}

/// Test: a record without email keeps `None` through storage
#[tokio::test]
async fn test_withheld_email_stays_absent() {
    let t = TestDirectory::new();
    let bob = User {
        email: None,
        ..user("2", "bob", "s2")
    };
    t.create_user(bob.clone()).await.unwrap();
    assert_eq!(t.get_user_by_login("bob").await.unwrap().unwrap().email, None);
}

/// Test: unicode profile fields survive unchanged
#[tokio::test]
async fn test_unicode_fields_round_trip() {
    let t = TestDirectory::new();
    let u = User {
        name: "Zoë Ångström 山田".to_string(),
        ..user("3", "zoë", "sé")
    };
    t.create_user(u.clone()).await.unwrap();
    assert_eq!(t.get_user_by_session_id("sé").await.unwrap(), Some(u));
}

/// Test: all three entries hold the same bytes at the same version
#[tokio::test]
async fn test_views_share_bytes_and_version() {
    let t = TestDirectory::new();
    let alice = user("1", "alice", "s1");
    t.create_user(alice.clone()).await.unwrap();

    let keys = UserKeys::for_user(&alice).unwrap().all();
    let entries = t.db.read_many(&keys, roster::Consistency::Strong).unwrap();
    let entries: Vec<_> = entries.into_iter().map(Option::unwrap).collect();
    assert!(entries.windows(2).all(|w| w[0].value == w[1].value && w[0].version == w[1].version));
}

/// Test: batch lookup returns records in input order with gaps as None
#[tokio::test]
async fn test_batch_lookup_by_ids() {
    let t = TestDirectory::new();
    for (id, login) in [("1", "alice"), ("2", "bob"), ("3", "carol")] {
        t.create_user(user(id, login, &format!("s{}", id))).await.unwrap();
    }

    let users = t.get_users_by_ids(&["2", "9", "1"]).await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[0].as_ref().unwrap().username, "bob");
    assert!(users[1].is_none());
    assert_eq!(users[2].as_ref().unwrap().username, "alice");

    let owned: Vec<String> = vec!["3".to_string()];
    assert_eq!(t.get_users_by_ids(&owned).await.unwrap()[0].as_ref().unwrap().id, "3");
}
