//! Key layout
//!
//! | Space | User key | Holds |
//! |-------|----------|-------|
//! | `users` | user id | the record |
//! | `users_by_login` | username | the record |
//! | `users_by_session` | session token | the record |

use roster_core::{Key, RosterResult};

use crate::user::{require_non_empty, User};

/// Primary index: user id
pub const USERS: &str = "users";
/// Secondary index: login handle
pub const USERS_BY_LOGIN: &str = "users_by_login";
/// Secondary index: session token
pub const USERS_BY_SESSION: &str = "users_by_session";

/// Key of the by-id entry
pub fn user_key(id: &str) -> RosterResult<Key> {
    require_non_empty("id", id)?;
    Ok(Key::new(USERS, id)?)
}

/// Key of the by-login entry
pub fn login_key(username: &str) -> RosterResult<Key> {
    require_non_empty("username", username)?;
    Ok(Key::new(USERS_BY_LOGIN, username)?)
}

/// Key of the by-session entry
pub fn session_key(session_id: &str) -> RosterResult<Key> {
    require_non_empty("session_id", session_id)?;
    Ok(Key::new(USERS_BY_SESSION, session_id)?)
}

/// The three index keys of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKeys {
    /// `users/<id>`
    pub by_id: Key,
    /// `users_by_login/<username>`
    pub by_login: Key,
    /// `users_by_session/<session_id>`
    pub by_session: Key,
}

impl UserKeys {
    /// Derive the keys of `user`
    pub fn for_user(user: &User) -> RosterResult<Self> {
        Ok(UserKeys {
            by_id: user_key(&user.id)?,
            by_login: login_key(&user.username)?,
            by_session: session_key(&user.session_id)?,
        })
    }

    /// All three keys, by-id first
    pub fn all(&self) -> [Key; 3] {
        [
            self.by_id.clone(),
            self.by_login.clone(),
            self.by_session.clone(),
        ]
    }
}
