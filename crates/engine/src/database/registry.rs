//! Process-wide registry of open databases
//!
//! Opening the same path twice returns handles to the same instance, so two
//! handles never append to one WAL independently. Entries are weak; a
//! database leaves the registry when its last handle drops.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Weak;

use super::DatabaseInner;

/// Global registry of open databases (canonical path -> weak reference)
pub(crate) static OPEN_DATABASES: Lazy<Mutex<HashMap<PathBuf, Weak<DatabaseInner>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Remove `path` unless it now belongs to a newer live instance
pub(crate) fn unregister(path: &Path) {
    let mut registry = OPEN_DATABASES.lock();
    if registry
        .get(path)
        .is_some_and(|weak| weak.strong_count() == 0)
    {
        registry.remove(path);
    }
}

/// Number of disk-backed databases currently open in this process
pub fn open_database_count() -> usize {
    OPEN_DATABASES
        .lock()
        .values()
        .filter(|weak| weak.strong_count() > 0)
        .count()
}

