//! Authenticated session state
//!
//! A session is an explicit value handed to whoever needs it, with
//! persistence behind a small store trait. Consumers pick the backing:
//! the CLI keeps a TOML file, tests keep memory.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The identity established by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub user_name: String,
}

impl Session {
    pub fn new(user_id: i64, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

impl From<&crate::types::LoginResponse> for Session {
    fn from(response: &crate::types::LoginResponse) -> Self {
        Self::new(response.user_id, response.user_name.clone())
    }
}

/// Key-value persistence seam for session state
pub trait SessionStore {
    /// Load the persisted session, if any
    fn load(&self) -> Result<Option<Session>>;

    /// Persist the session (login)
    fn save(&self, session: &Session) -> Result<()>;

    /// Remove the persisted session (logout)
    fn clear(&self) -> Result<()>;
}

/// In-memory store, mainly for tests
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().map(|s| s.clone()).unwrap_or(None))
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Ok(mut slot) = self.session.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.session.lock() {
            *slot = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);

        let session = Session::new(3, "alice");
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_session_from_login_response() {
        let response = crate::types::LoginResponse {
            message: None,
            user_id: 9,
            user_name: "bob".into(),
        };
        assert_eq!(Session::from(&response), Session::new(9, "bob"));
    }
}
