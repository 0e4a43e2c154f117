//! Database configuration via `roster.toml`
//!
//! On first open a default `roster.toml` is created in the data directory.
//! To change settings, edit the file and reopen, or pass a config to
//! [`Database::open_with_config`](super::Database::open_with_config), which
//! persists it.

use roster_core::{Limits, RosterError, RosterResult};
use roster_durability::DurabilityMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "roster.toml";

/// How the replica watermark served to eventual reads advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationMode {
    /// The watermark follows every commit; eventual reads equal strong reads
    Synchronous,
    /// The maintenance thread catches the watermark up on every tick
    Periodic {
        /// Tick interval in milliseconds
        interval_ms: u64,
    },
    /// Only [`Database::catch_up_replica`](super::Database::catch_up_replica) moves it
    Manual,
}

impl ReplicationMode {
    /// Config-file spelling of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationMode::Synchronous => "synchronous",
            ReplicationMode::Periodic { .. } => "periodic",
            ReplicationMode::Manual => "manual",
        }
    }
}

/// `[replication]` section of `roster.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// `"synchronous"`, `"periodic"` or `"manual"`
    #[serde(default = "default_replication_mode_str")]
    pub mode: String,
    /// Maintenance tick in milliseconds (default: 50)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_replication_mode_str() -> String {
    "periodic".to_string()
}

fn default_interval_ms() -> u64 {
    50
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            mode: default_replication_mode_str(),
            interval_ms: default_interval_ms(),
        }
    }
}

/// Database configuration loaded from `roster.toml`.
///
/// # Example
///
/// ```toml
/// durability = "standard"
///
/// [replication]
/// mode = "periodic"
/// interval_ms = 50
///
/// [limits]
/// max_key_bytes = 2048
/// max_value_bytes = 65536
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Durability mode: `"cache"`, `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// Replica watermark policy for eventual reads.
    #[serde(default)]
    pub replication: ReplicationConfig,
    /// Key and value size limits.
    #[serde(default)]
    pub limits: Limits,
}

fn default_durability_str() -> String {
    "standard".to_string()
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            durability: default_durability_str(),
            replication: ReplicationConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl RosterConfig {
    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for anything but `"cache"`, `"standard"` or `"always"`.
    pub fn durability_mode(&self) -> RosterResult<DurabilityMode> {
        match self.durability.as_str() {
            "standard" => Ok(DurabilityMode::standard_default()),
            "always" => Ok(DurabilityMode::Always),
            "cache" => Ok(DurabilityMode::Cache),
            other => Err(RosterError::invalid_input(format!(
                "invalid durability mode '{}' in {}; expected \"cache\", \"standard\" or \"always\"",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Parse the `[replication]` section into a `ReplicationMode`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown mode or a zero interval.
    pub fn replication_mode(&self) -> RosterResult<ReplicationMode> {
        if self.replication.interval_ms == 0 {
            return Err(RosterError::invalid_input(format!(
                "replication.interval_ms in {} must be greater than zero",
                CONFIG_FILE_NAME
            )));
        }
        match self.replication.mode.as_str() {
            "synchronous" => Ok(ReplicationMode::Synchronous),
            "periodic" => Ok(ReplicationMode::Periodic {
                interval_ms: self.replication.interval_ms,
            }),
            "manual" => Ok(ReplicationMode::Manual),
            other => Err(RosterError::invalid_input(format!(
                "invalid replication mode '{}' in {}; expected \"synchronous\", \"periodic\" or \"manual\"",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Interval between maintenance ticks.
    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_millis(self.replication.interval_ms.max(1))
    }

    /// Check every field eagerly.
    pub fn validate(&self) -> RosterResult<()> {
        self.durability_mode()?;
        self.replication_mode()?;
        if self.limits.max_key_bytes == 0 || self.limits.max_value_bytes == 0 {
            return Err(RosterError::invalid_input("size limits must be greater than zero"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Roster database configuration
#
# Durability mode: "standard" (default), "always" or "cache"
#   "standard" = periodic fsync (~100ms), may lose the last interval on crash
#   "always"   = fsync every commit, zero data loss
#   "cache"    = no write-ahead log, nothing survives a restart
durability = "standard"

[replication]
# How eventual reads catch up with commits
#   "periodic"    = background thread catches up every interval_ms (default)
#   "synchronous" = eventual reads always see the latest commit
#   "manual"      = only Database::catch_up_replica() advances it
mode = "periodic"
interval_ms = 50

[limits]
max_key_bytes = 2048
max_value_bytes = 65536
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> RosterResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RosterError::storage(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: RosterConfig = toml::from_str(&content).map_err(|e| {
            RosterError::invalid_input(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> RosterResult<()> {
        if !path.exists() {
            write_atomic(path, Self::default_toml()).map_err(|e| {
                RosterError::storage(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> RosterResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RosterError::serialization(format!("failed to serialize config: {}", e)))?;
        write_atomic(path, &content).map_err(|e| {
            RosterError::storage(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Write through a temporary file and rename, so concurrent readers see
/// either the old content or the new, never a prefix
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let tmp = path.with_extension(format!(
        "toml.{}.{}.tmp",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&tmp, content)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
