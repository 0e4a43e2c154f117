//! Shared helpers for the directory comprehensive suite

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Once};

use roster::{
    Database, DatabaseBuilder, DirectoryOptions, ReplicationMode, SessionRotation, User,
    UserDirectory,
};
use tempfile::TempDir;

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness writer
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Build a user record with predictable profile fields
pub fn user(id: &str, username: &str, session_id: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: Some(format!("{}@example.com", username)),
        username: username.to_string(),
        avatar_url: format!("https://avatars.example.com/{}", id),
        session_id: session_id.to_string(),
    }
}

// ============================================================================
// TestDirectory
// ============================================================================

/// A directory plus the database behind it
pub struct TestDirectory {
    pub directory: UserDirectory,
    pub db: Database,
    pub dir: Option<TempDir>,
}

impl TestDirectory {
    /// In-memory database, periodic replication, default options
    pub fn new() -> Self {
        Self::with_rotation(SessionRotation::RetainPrevious)
    }

    /// In-memory database with the given rotation policy
    pub fn with_rotation(rotation: SessionRotation) -> Self {
        init_tracing();
        let db = Database::ephemeral().expect("ephemeral database");
        Self::wrap(db, rotation, None)
    }

    /// In-memory database whose replica only moves on `catch_up_replica`
    pub fn manual_replication() -> Self {
        init_tracing();
        let db = DatabaseBuilder::new()
            .replication(ReplicationMode::Manual)
            .ephemeral()
            .expect("ephemeral database");
        Self::wrap(db, SessionRotation::RetainPrevious, None)
    }

    /// Disk-backed database in a fresh temp directory
    pub fn on_disk() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("temp dir");
        let db = Database::open(dir.path()).expect("disk database");
        Self::wrap(db, SessionRotation::RetainPrevious, Some(dir))
    }

    fn wrap(db: Database, rotation: SessionRotation, dir: Option<TempDir>) -> Self {
        let directory = UserDirectory::with_options(
            Arc::new(db.clone()),
            DirectoryOptions::default().with_rotation(rotation),
        );
        TestDirectory { directory, db, dir }
    }

    /// Data directory of a disk-backed instance
    pub fn path(&self) -> &Path {
        self.dir.as_ref().expect("disk-backed test directory").path()
    }

    /// Shut down and open the same data directory again
    pub fn reopen(self) -> Self {
        let TestDirectory { directory, db, dir } = self;
        let dir = dir.expect("disk-backed test directory");
        drop(directory);
        db.shutdown().expect("shutdown");
        drop(db);
        let db = Database::open(dir.path()).expect("reopen");
        Self::wrap(db, SessionRotation::RetainPrevious, Some(dir))
    }
}

impl std::ops::Deref for TestDirectory {
    type Target = UserDirectory;

    fn deref(&self) -> &UserDirectory {
        &self.directory
    }
}
