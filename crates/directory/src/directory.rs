//! User directory over a transactional key-value store
//!
//! Every user is stored three times, under `users/<id>`,
//! `users_by_login/<username>` and `users_by_session/<session_id>`, each copy
//! the same encoded bytes. Any change touching more than one of those keys
//! goes through a single atomic group with explicit checks, so no reader ever
//! sees the views disagree.
//!
//! The directory holds no locks of its own; the store's atomic commit is the
//! only concurrency control.

use std::sync::Arc;

use roster_core::{
    AtomicGroup, Consistency, KvStore, RosterError, RosterResult, Value, VersionedValue,
};
use tracing::{debug, info, warn};

use crate::keys::{login_key, session_key, user_key, UserKeys};
use crate::options::{DirectoryOptions, SessionRotation};
use crate::session::session_prefix;
use crate::user::{require_non_empty, ExternalIdentity, User};

/// Session-aware user directory
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn KvStore>,
    options: DirectoryOptions,
}

impl UserDirectory {
    /// Directory over `store` with default options
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_options(store, DirectoryOptions::default())
    }

    /// Directory over `store` with explicit options
    pub fn with_options(store: Arc<dyn KvStore>, options: DirectoryOptions) -> Self {
        Self { store, options }
    }

    /// Options in effect
    pub fn options(&self) -> &DirectoryOptions {
        &self.options
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Create a user under all three index keys at once
    ///
    /// # Errors
    ///
    /// - `Conflict` if the id, the username or the session token is already
    ///   taken. The rejection lists which keys failed; retrying with the same
    ///   record fails again.
    /// - `InvalidInput` if the id, username or session token is empty
    pub async fn create_user(&self, user: User) -> RosterResult<User> {
        user.validate()?;
        let keys = UserKeys::for_user(&user)?;
        let value = Value::encode(&user)?;

        let group = AtomicGroup::new()
            .check_absent(keys.by_id.clone())
            .check_absent(keys.by_login.clone())
            .check_absent(keys.by_session.clone())
            .set(keys.by_id, value.clone())
            .set(keys.by_login, value.clone())
            .set(keys.by_session, value);

        match self.store.commit(group).await?.into_result("create_user") {
            Ok(version) => {
                info!(
                    target: "roster::directory",
                    user_id = %user.id,
                    username = %user.username,
                    session = session_prefix(&user.session_id),
                    version = version.as_u64(),
                    "user created"
                );
                Ok(user)
            }
            Err(e) => {
                warn!(
                    target: "roster::directory",
                    user_id = %user.id,
                    username = %user.username,
                    failed_checks = e.rejection().map_or(0, |r| r.failures().len()),
                    "user creation rejected"
                );
                Err(e)
            }
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Strong point read of `users/<id>`
    pub async fn get_user_by_id(&self, id: &str) -> RosterResult<Option<User>> {
        let entry = self.store.get(&user_key(id)?, Consistency::Strong).await?;
        decode(entry)
    }

    /// Strong point read of `users_by_login/<username>`
    pub async fn get_user_by_login(&self, username: &str) -> RosterResult<Option<User>> {
        let entry = self.store.get(&login_key(username)?, Consistency::Strong).await?;
        decode(entry)
    }

    /// Resolve a session token
    ///
    /// Tries an eventual read first. A hit is returned as is, possibly stale.
    /// A miss is confirmed with a strong read before reporting absence, so a
    /// session committed just before this call is always found.
    pub async fn get_user_by_session_id(&self, session_id: &str) -> RosterResult<Option<User>> {
        let key = session_key(session_id)?;

        if let Some(entry) = self.store.get(&key, Consistency::Eventual).await? {
            return decode(Some(entry));
        }

        debug!(
            target: "roster::directory",
            session = session_prefix(session_id),
            "eventual session lookup missed, confirming with strong read"
        );
        let entry = self.store.get(&key, Consistency::Strong).await?;
        decode(entry)
    }

    /// Batch read of `users/<id>` for every id, in input order
    ///
    /// Each slot is read independently; there is no consistency guarantee
    /// across slots beyond each record being whole.
    pub async fn get_users_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> RosterResult<Vec<Option<User>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys = ids
            .iter()
            .map(|id| user_key(id.as_ref()))
            .collect::<RosterResult<Vec<_>>>()?;

        self.store
            .get_many(&keys, Consistency::Strong)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    // ========================================================================
    // Session rotation
    // ========================================================================

    /// Move `user` to a new session token
    ///
    /// Rewrites the by-id and by-login entries with `user` carrying
    /// `session_id`, and claims `users_by_session/<session_id>`, all in one
    /// atomic group. The group checks that neither stored entry changed
    /// since it was read and that the new token is unclaimed.
    ///
    /// What happens to the previous by-session entry depends on
    /// [`SessionRotation`].
    ///
    /// # Errors
    ///
    /// - `IntegrityViolation` if the by-id or by-login entry does not exist
    /// - `Conflict` if either entry changed concurrently or the token is taken
    /// - `InvalidInput` if `session_id` is empty
    pub async fn set_user_session(&self, user: &User, session_id: &str) -> RosterResult<User> {
        let id_key = user_key(&user.id)?;
        let login_key = login_key(&user.username)?;
        let new_session_key = session_key(session_id)?;

        let current = self
            .store
            .get_many(&[id_key.clone(), login_key.clone()], Consistency::Strong)
            .await?;
        let (by_id, by_login) = match <[Option<VersionedValue>; 2]>::try_from(current) {
            Ok([Some(by_id), Some(by_login)]) => (by_id, by_login),
            Ok([by_id, _]) => {
                let missing = if by_id.is_none() { &id_key } else { &login_key };
                return Err(RosterError::integrity(format!("{} does not exist", missing)));
            }
            Err(slots) => {
                return Err(RosterError::storage(format!(
                    "get_many returned {} slots for 2 keys",
                    slots.len()
                )))
            }
        };

        let updated = user.with_session(session_id);
        let value = Value::encode(&updated)?;

        let mut group = AtomicGroup::new()
            .check(id_key.clone(), Some(by_id.version))
            .check(login_key.clone(), Some(by_login.version))
            .check_absent(new_session_key.clone());

        if self.options.rotation == SessionRotation::RevokePrevious {
            let stored: User = by_id.value.decode()?;
            if stored.session_id != session_id {
                group = self.revoke_previous(group, &stored).await?;
            }
        }

        let group = group
            .set(id_key, value.clone())
            .set(login_key, value.clone())
            .set(new_session_key, value);

        match self.store.commit(group).await?.into_result("set_user_session") {
            Ok(version) => {
                info!(
                    target: "roster::directory",
                    user_id = %updated.id,
                    session = session_prefix(session_id),
                    rotation = ?self.options.rotation,
                    version = version.as_u64(),
                    "session rotated"
                );
                Ok(updated)
            }
            Err(e) => {
                warn!(
                    target: "roster::directory",
                    user_id = %user.id,
                    session = session_prefix(session_id),
                    failed_checks = e.rejection().map_or(0, |r| r.failures().len()),
                    "session rotation rejected"
                );
                Err(e)
            }
        }
    }

    /// Add a checked delete of the stored record's current session entry
    ///
    /// Only an entry that still belongs to the same user is removed.
    async fn revoke_previous(&self, group: AtomicGroup, stored: &User) -> RosterResult<AtomicGroup> {
        let previous_key = session_key(&stored.session_id)?;
        let Some(entry) = self.store.get(&previous_key, Consistency::Strong).await? else {
            return Ok(group);
        };
        let owner: User = entry.value.decode()?;
        if owner.id != stored.id {
            return Ok(group);
        }
        Ok(group
            .check(previous_key.clone(), Some(entry.version))
            .delete(previous_key))
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete all three index entries of `user` at once
    ///
    /// The keys are derived from `user` as given, including its session
    /// token. Each is checked against the version read just before, absent
    /// entries included, so a concurrent change aborts the whole deletion.
    ///
    /// # Errors
    ///
    /// `Conflict` if any of the three entries changed between read and commit.
    pub async fn delete_user(&self, user: &User) -> RosterResult<()> {
        let keys = UserKeys::for_user(user)?;
        let current = self
            .store
            .get_many(&keys.all(), Consistency::Strong)
            .await?;
        if current.len() != 3 {
            return Err(RosterError::storage(format!(
                "get_many returned {} slots for 3 keys",
                current.len()
            )));
        }

        let mut group = AtomicGroup::new();
        for (key, entry) in keys.all().into_iter().zip(&current) {
            group = group.check(key, entry.as_ref().map(|e| e.version));
        }
        for key in keys.all() {
            group = group.delete(key);
        }

        match self.store.commit(group).await?.into_result("delete_user") {
            Ok(version) => {
                info!(
                    target: "roster::directory",
                    user_id = %user.id,
                    version = version.as_u64(),
                    "user deleted"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    target: "roster::directory",
                    user_id = %user.id,
                    "user deletion rejected"
                );
                Err(e)
            }
        }
    }

    /// Remove only `users_by_session/<session_id>`
    ///
    /// Unconditional; succeeds whether or not the entry exists. The by-id and
    /// by-login entries keep the token on the record.
    pub async fn delete_user_by_session(&self, session_id: &str) -> RosterResult<()> {
        let key = session_key(session_id)?;
        self.store.delete(&key).await?;
        debug!(
            target: "roster::directory",
            session = session_prefix(session_id),
            "session entry deleted"
        );
        Ok(())
    }

    // ========================================================================
    // Sign-in flow
    // ========================================================================

    /// Record a successful sign-in
    ///
    /// Creates the user on first sign-in, otherwise rotates the existing
    /// record to `session_id`. Returns the stored record. No retries: a
    /// `Conflict` reaches the caller, who decides whether a fresh token is
    /// worth another attempt.
    pub async fn sign_in(&self, identity: &ExternalIdentity, session_id: &str) -> RosterResult<User> {
        require_non_empty("session_id", session_id)?;

        match self.get_user_by_id(&identity.user_id()).await? {
            None => self.create_user(identity.to_user(session_id)).await,
            Some(existing) => self.set_user_session(&existing, session_id).await,
        }
    }

    /// Log out a session; equal to [`delete_user_by_session`](Self::delete_user_by_session)
    pub async fn sign_out(&self, session_id: &str) -> RosterResult<()> {
        self.delete_user_by_session(session_id).await
    }
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn decode(entry: Option<VersionedValue>) -> RosterResult<Option<User>> {
    entry.map(|e| e.value.decode::<User>()).transpose()
}
