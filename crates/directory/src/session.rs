//! Session tokens

use uuid::Uuid;

/// Characters of a token that may appear in logs
const LOGGED_PREFIX_CHARS: usize = 8;

/// Generate a fresh session token: a random UUID as 32 lowercase hex digits
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Loggable prefix of a session token
pub fn session_prefix(session_id: &str) -> &str {
    match session_id.char_indices().nth(LOGGED_PREFIX_CHARS) {
        Some((end, _)) => &session_id[..end],
        None => session_id,
    }
}
