//! The user record and the identity it is built from

use roster_core::{RosterError, RosterResult};
use serde::{Deserialize, Serialize};

/// A signed-up user
///
/// The same encoded record is stored under all three index keys. Field names
/// serialize in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identity assigned by the identity provider; immutable
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address, when the provider discloses it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Unique login handle; immutable
    pub username: String,
    /// Avatar image URL
    pub avatar_url: String,
    /// Current session token
    pub session_id: String,
}

impl User {
    /// Copy of this record carrying a different session token
    pub fn with_session(&self, session_id: impl Into<String>) -> User {
        User {
            session_id: session_id.into(),
            ..self.clone()
        }
    }

    /// Reject records whose index keys would be empty
    pub fn validate(&self) -> RosterResult<()> {
        require_non_empty("id", &self.id)?;
        require_non_empty("username", &self.username)?;
        require_non_empty("session_id", &self.session_id)
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> RosterResult<()> {
    if value.is_empty() {
        return Err(RosterError::invalid_input(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Profile resolved by the identity provider after a successful handshake
///
/// Field names follow the provider's JSON (`avatar_url`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Provider-assigned numeric id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Login handle
    pub login: String,
    /// Avatar image URL
    pub avatar_url: String,
    /// Email, if the user made it public
    #[serde(default)]
    pub email: Option<String>,
}

impl ExternalIdentity {
    /// The user id this identity maps to
    pub fn user_id(&self) -> String {
        self.id.to_string()
    }

    /// Build a new user record for this identity
    pub fn to_user(&self, session_id: impl Into<String>) -> User {
        User {
            id: self.user_id(),
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.login.clone(),
            avatar_url: self.avatar_url.clone(),
            session_id: session_id.into(),
        }
    }
}
