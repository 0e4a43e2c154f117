//! Racing sign-ins, rotations and lookups

use std::sync::Arc;

use crate::test_utils::*;
use roster::{new_session_id, ExternalIdentity, SessionRotation};
use tokio::sync::Barrier;

fn identity(id: u64) -> ExternalIdentity {
    ExternalIdentity {
        id,
        name: format!("Person {}", id),
        login: format!("person{}", id),
        avatar_url: String::new(),
        email: None,
    }
}

/// Test: many users signing in concurrently all end up resolvable
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_sign_ins_of_distinct_users() {
    const USERS: u64 = 32;
    let t = Arc::new(TestDirectory::new());
    let barrier = Arc::new(Barrier::new(USERS as usize));

    let handles: Vec<_> = (0..USERS)
        .map(|id| {
            let t = Arc::clone(&t);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                let session = new_session_id();
                barrier.wait().await;
                t.sign_in(&identity(id), &session).await.unwrap();
                session
            })
        })
        .collect();

    for (id, handle) in handles.into_iter().enumerate() {
        let session = handle.await.unwrap();
        let found = t.get_user_by_session_id(&session).await.unwrap().unwrap();
        assert_eq!(found.id, id.to_string());
    }
    assert_eq!(t.db.live_keys(), USERS as usize * 3);
}

/// Test: concurrent sign-ins of one identity leave a single consistent record
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_sign_ins_of_one_user() {
    const TASKS: usize = 8;
    let t = Arc::new(TestDirectory::with_rotation(SessionRotation::RevokePrevious));
    t.sign_in(&identity(1), &new_session_id()).await.unwrap();
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let t = Arc::clone(&t);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                t.sign_in(&identity(1), &new_session_id()).await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert!(e.is_conflict(), "{}", e),
        }
    }
    assert!(succeeded >= 1);

    let record = t.get_user_by_id("1").await.unwrap().unwrap();
    assert_eq!(t.get_user_by_login("person1").await.unwrap(), Some(record.clone()));
    assert_eq!(t.get_user_by_session_id(&record.session_id).await.unwrap(), Some(record));
    // Every winner revoked its predecessor
    assert_eq!(t.db.live_keys(), 3);
}

/// Test: session lookups during rotations only ever resolve to the right user
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lookups_during_rotation_never_cross_users() {
    let t = Arc::new(TestDirectory::new());
    let alice = t.create_user(user("1", "alice", "a0")).await.unwrap();
    t.create_user(user("2", "bob", "b0")).await.unwrap();

    let rotator = {
        let t = Arc::clone(&t);
        tokio::spawn(async move {
            let mut current = alice;
            for round in 1..=50 {
                current = t.set_user_session(&current, &format!("a{}", round)).await.unwrap();
            }
        })
    };

    for round in 0..200 {
        let token = format!("a{}", round % 51);
        if let Some(found) = t.get_user_by_session_id(&token).await.unwrap() {
            assert_eq!(found.id, "1");
            assert_eq!(found.session_id, token);
        }
        assert_eq!(t.get_user_by_session_id("b0").await.unwrap().unwrap().id, "2");
        tokio::task::yield_now().await;
    }
    rotator.await.unwrap();
}
