//! Generated operation sequences checked against a simple model
//!
//! After every step the directory must agree with the model on which users
//! exist, and a by-session entry always carries its own token. A token that
//! is some user's current one resolves to exactly that user's record.

use std::collections::BTreeMap;

use proptest::prelude::*;
use roster::{SessionRotation, User};

use crate::test_utils::*;

#[derive(Debug, Clone)]
enum Op {
    Create { id: u8, login: u8, session: u8 },
    Rotate { id: u8, session: u8 },
    SignOut { session: u8 },
    Delete { id: u8 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4u8, 0..4u8, 0..8u8).prop_map(|(id, login, session)| Op::Create { id, login, session }),
        (0..4u8, 0..8u8).prop_map(|(id, session)| Op::Rotate { id, session }),
        (0..8u8).prop_map(|session| Op::SignOut { session }),
        (0..4u8).prop_map(|id| Op::Delete { id }),
    ]
}

fn record(id: u8, login: u8, session: u8) -> User {
    user(&format!("u{}", id), &format!("login{}", login), &format!("tok{}", session))
}

async fn check_sequence(ops: Vec<Op>, rotation: SessionRotation) {
    let t = TestDirectory::with_rotation(rotation);
    let mut model: BTreeMap<String, User> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Create { id, login, session } => {
                let candidate = record(id, login, session);
                if let Ok(created) = t.create_user(candidate).await {
                    model.insert(created.id.clone(), created);
                }
            }
            Op::Rotate { id, session } => {
                if let Some(current) = model.get(&format!("u{}", id)).cloned() {
                    match t.set_user_session(&current, &format!("tok{}", session)).await {
                        Ok(updated) => {
                            model.insert(updated.id.clone(), updated);
                        }
                        Err(e) => assert!(e.is_conflict(), "{}", e),
                    }
                }
            }
            Op::SignOut { session } => {
                t.sign_out(&format!("tok{}", session)).await.unwrap();
            }
            Op::Delete { id } => {
                if let Some(current) = model.get(&format!("u{}", id)).cloned() {
                    t.delete_user(&current).await.unwrap();
                    model.remove(&current.id);
                }
            }
        }

        for id in 0..4u8 {
            let id = format!("u{}", id);
            let stored = t.get_user_by_id(&id).await.unwrap();
            assert_eq!(stored.as_ref(), model.get(&id));
            if let Some(stored) = stored {
                assert_eq!(t.get_user_by_login(&stored.username).await.unwrap(), Some(stored.clone()));
            }
        }
        for session in 0..8u8 {
            let token = format!("tok{}", session);
            if let Some(owner) = t.get_user_by_session_id(&token).await.unwrap() {
                assert_eq!(owner.session_id, token);
                if let Some(current) = model.get(&owner.id).filter(|u| u.session_id == token) {
                    assert_eq!(current, &owner);
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_views_agree_retain(ops in prop::collection::vec(op(), 1..24)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(check_sequence(ops, SessionRotation::RetainPrevious));
    }

    #[test]
    fn prop_views_agree_revoke(ops in prop::collection::vec(op(), 1..24)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(check_sequence(ops, SessionRotation::RevokePrevious));
    }
}
