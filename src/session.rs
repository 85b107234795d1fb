//! Per-role conversation sessions
//!
//! The backend correlates assistant exchanges through an opaque session id.
//! One id is kept per role, persisted in a key-value store so it survives
//! reloads.

mod sqlite;

pub use sqlite::SqliteSessionStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Prefix of the persisted key; the role is appended
pub const SESSION_KEY_PREFIX: &str = "role_assistant_session_";

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session store lock poisoned")]
    Poisoned,
}

/// Durable string storage keyed by string
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Overwrites any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        (**self).set(key, value)
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let entries = self.entries.lock().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().map_err(|_| SessionStoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage key for a role's session id
pub fn session_key(role: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{role}")
}

/// Owns the session id of one role
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    role: String,
    current: String,
}

impl SessionManager {
    /// Load the persisted session for `role`
    pub fn open(store: Arc<dyn SessionStore>, role: impl Into<String>) -> Self {
        let role = role.into();
        let mut manager = Self {
            store,
            role,
            current: String::new(),
        };
        manager.current = manager.load_session(&manager.role);
        manager
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Persisted id for `role`, empty if there is none or it can't be read
    pub fn load_session(&self, role: &str) -> String {
        match self.store.get(&session_key(role)) {
            Ok(Some(id)) => id,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(role, error = %e, "Failed to load session, starting without one");
                String::new()
            }
        }
    }

    /// Persist `session_id` for `role`
    pub fn save_session(&self, role: &str, session_id: &str) -> Result<(), SessionStoreError> {
        self.store.set(&session_key(role), session_id)
    }

    /// Id sent with the next query
    pub fn current_session_id(&self) -> &str {
        &self.current
    }

    /// Adopt the id carried by a reply
    ///
    /// `None` or an empty id keeps the current one. Returns whether the
    /// current id changed.
    pub fn accept_reply_session(&mut self, session_id: Option<&str>) -> bool {
        let Some(id) = session_id.filter(|id| !id.is_empty()) else {
            return false;
        };
        if let Err(e) = self.save_session(&self.role, id) {
            tracing::warn!(role = %self.role, error = %e, "Failed to persist session id");
        }
        if self.current == id {
            return false;
        }
        tracing::debug!(role = %self.role, "Session id updated");
        self.current = id.to_string();
        true
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("role", &self.role)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
