//! Session-aware user directory for Roster
//!
//! This crate keeps user records addressable three ways over any
//! [`roster_core::KvStore`]:
//! - `users/<id>`: the primary entry
//! - `users_by_login/<username>`: unique login handle
//! - `users_by_session/<session_id>`: session token lookup
//!
//! Multi-key changes (create, session rotation, delete) are single atomic
//! groups, so the three views never disagree. Session lookups read eventually
//! consistent and fall back to a strong read on a miss.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod directory;
pub mod keys;
pub mod options;
pub mod session;
pub mod user;

pub use directory::UserDirectory;
pub use keys::{login_key, session_key, user_key, UserKeys, USERS, USERS_BY_LOGIN, USERS_BY_SESSION};
pub use options::{DirectoryOptions, SessionRotation};
pub use session::{new_session_id, session_prefix};
pub use user::{ExternalIdentity, User};
