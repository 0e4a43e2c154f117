//! Read consistency levels

use serde::{Deserialize, Serialize};

/// Consistency level for point reads
///
/// | Level | Sees | Cost |
/// |-------|------|------|
/// | Strong | Latest committed version | Full |
/// | Eventual | Last version visible at the replica watermark | Lower |
///
/// An eventual read may be stale but is never torn: it returns one whole
/// committed value or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// Reflects every committed write
    #[default]
    Strong,
    /// May lag behind recent commits
    Eventual,
}

impl Consistency {
    /// Whether this level may return stale data
    #[inline]
    pub const fn is_relaxed(&self) -> bool {
        matches!(self, Consistency::Eventual)
    }
}
