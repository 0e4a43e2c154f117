//! Durability mode configuration
//!
//! Controls whether commits reach a WAL and when it is fsynced.

/// Durability mode for WAL operations
///
/// | Mode | fsync | Data loss window on crash |
/// |------|-------|---------------------------|
/// | Cache | Never | Everything |
/// | Always | Every commit | None |
/// | Standard | Periodic | Up to `interval_ms` or `batch_size` commits |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// No WAL at all; used by ephemeral databases
    Cache,

    /// fsync after every commit
    Always,

    /// fsync every `batch_size` commits or every `interval_ms`, whichever first
    Standard {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Whether commits are written to a WAL
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::Cache)
    }

    /// Whether every commit is fsynced before it returns
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Always)
    }

    /// `Standard { interval_ms: 100, batch_size: 1000 }`
    pub fn standard_default() -> Self {
        DurabilityMode::Standard {
            interval_ms: 100,
            batch_size: 1000,
        }
    }

    /// Config-file spelling of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            DurabilityMode::Cache => "cache",
            DurabilityMode::Always => "always",
            DurabilityMode::Standard { .. } => "standard",
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::standard_default()
    }
}
