//! Directory behavior switches

use serde::{Deserialize, Serialize};

/// What session rotation does with the previous by-session entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRotation {
    /// Leave it in place
    ///
    /// It keeps resolving to the pre-rotation record until the caller signs
    /// it out. It never resolves to a different user.
    #[default]
    RetainPrevious,
    /// Delete it in the same atomic group as the rotation
    RevokePrevious,
}

/// Options for a [`UserDirectory`](crate::UserDirectory)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectoryOptions {
    /// Previous-session policy for `set_user_session`
    #[serde(default)]
    pub rotation: SessionRotation,
}

impl DirectoryOptions {
    /// Set the rotation policy
    pub fn with_rotation(mut self, rotation: SessionRotation) -> Self {
        self.rotation = rotation;
        self
    }
}
