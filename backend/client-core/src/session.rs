//! Session identifier persisted in session storage.
//!
//! The identifier is assigned once by the server and never replaced while the
//! storage scope lives.

use crate::storage::Storage;

use log::{debug, info};

/// Reserved session-storage key holding the identifier.
pub const SESSION_ID_KEY: &str = "_webmirror_sessionId";

pub struct SessionStore<'a> {
    storage: &'a mut Storage,
}

impl<'a> SessionStore<'a> {
    pub fn new(storage: &'a mut Storage) -> Self {
        Self { storage }
    }

    pub fn get(&self) -> Option<&str> {
        session_id(self.storage)
    }

    /// Persist `id` unless an identifier is already stored.
    ///
    /// Returns `true` when the identifier was written.
    pub fn set(&mut self, id: &str) -> bool {
        if id.is_empty() {
            debug!("Ignoring empty session id assignment");
            return false;
        }

        if let Some(existing) = session_id(self.storage) {
            if existing != id {
                debug!("Session id already assigned, ignoring replacement");
            }
            return false;
        }

        self.storage.set(SESSION_ID_KEY, id);
        info!("Session id assigned");
        true
    }
}

/// Read-only lookup for callers that only hold a shared borrow.
pub fn session_id(storage: &Storage) -> Option<&str> {
    storage.get(SESSION_ID_KEY).filter(|id| !id.is_empty())
}
