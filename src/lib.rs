//! Roster - session-aware user directory over a transactional key-value store
//!
//! Roster keeps each user reachable by id, by login handle and by current
//! session token. The three views are maintained with atomic groups, so a
//! session rotation or deletion is never observed half done.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use roster::{new_session_id, Database, ExternalIdentity, UserDirectory};
//!
//! // Open (or create) a data directory
//! let db = Database::open("./roster-data")?;
//! let directory = UserDirectory::new(Arc::new(db.clone()));
//!
//! // After the identity provider resolves the signed-in account
//! let session = new_session_id();
//! let user = directory.sign_in(&identity, &session).await?;
//!
//! // Later requests carry only the session token
//! let current = directory.get_user_by_session_id(&session).await?;
//!
//! db.shutdown()?;
//! ```
//!
//! # Architecture
//!
//! [`UserDirectory`] talks to any [`KvStore`]. [`Database`] is the bundled
//! implementation: an MVCC in-memory store with a write-ahead log, a
//! replica watermark for eventual reads, and a background maintenance thread.
//! Storage, concurrency and durability internals are not re-exported.

pub use roster_core::{
    AtomicGroup, CheckFailure, CommitOutcome, CommitRejection, Consistency, Key, KvStore, Limits,
    RosterError, RosterResult, Value, Version, Versioned, VersionedValue,
};
pub use roster_directory::{
    new_session_id, session_prefix, DirectoryOptions, ExternalIdentity, SessionRotation, User,
    UserDirectory, UserKeys,
};
pub use roster_engine::{
    Database, DatabaseBuilder, DurabilityMode, ReplicationConfig, ReplicationMode, RosterConfig,
};
