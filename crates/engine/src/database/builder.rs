//! Fluent construction of a `Database`
//!
//! ```text
//! let db = Database::builder()
//!     .path("/var/lib/roster")
//!     .always()
//!     .replication(ReplicationMode::Synchronous)
//!     .open()?;
//! ```

use std::path::PathBuf;

use roster_core::{Limits, RosterError, RosterResult};
use roster_durability::DurabilityMode;

use super::config::{ReplicationConfig, ReplicationMode, RosterConfig};
use super::Database;

/// Builder for `Database`
///
/// Starts from `RosterConfig::default()`.
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    /// Database path (required for `open()`)
    path: Option<PathBuf>,
    config: RosterConfig,
}

impl DatabaseBuilder {
    /// Create new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set database path
    ///
    /// Required for `open()`. Ignored by `ephemeral()`.
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the durability mode
    ///
    /// `Standard` always uses the default interval and batch size; the config
    /// file has no fields for them.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.config.durability = mode.as_str().to_string();
        self
    }

    /// No WAL; nothing survives a restart
    pub fn cache(self) -> Self {
        self.durability(DurabilityMode::Cache)
    }

    /// Periodic fsync (default)
    pub fn standard(self) -> Self {
        self.durability(DurabilityMode::standard_default())
    }

    /// fsync every commit
    pub fn always(self) -> Self {
        self.durability(DurabilityMode::Always)
    }

    /// Set the replication mode
    pub fn replication(mut self, mode: ReplicationMode) -> Self {
        let interval_ms = match mode {
            ReplicationMode::Periodic { interval_ms } => interval_ms,
            _ => self.config.replication.interval_ms,
        };
        self.config.replication = ReplicationConfig {
            mode: mode.as_str().to_string(),
            interval_ms,
        };
        self
    }

    /// Set key and value size limits
    pub fn limits(mut self, limits: Limits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: RosterConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration built so far
    pub fn build_config(&self) -> &RosterConfig {
        &self.config
    }

    /// Open a disk-backed database at the configured path
    ///
    /// The configuration is persisted to `roster.toml`.
    pub fn open(self) -> RosterResult<Database> {
        let path = self.path.ok_or_else(|| {
            RosterError::invalid_input("DatabaseBuilder::open requires a path; use ephemeral() instead")
        })?;
        Database::open_with_config(path, self.config)
    }

    /// Open an in-memory database
    pub fn ephemeral(self) -> RosterResult<Database> {
        Database::ephemeral_with_config(self.config)
    }
}
