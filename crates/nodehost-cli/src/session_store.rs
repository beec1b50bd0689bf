//! TOML-file session persistence
//!
//! Keeps the logged-in identity in the user's config directory so commands
//! that need a user id work across invocations.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use nodehost_client::{NodehostError, Session, SessionStore};

/// Session store backed by a TOML file under the config directory
#[derive(Debug, Clone)]
pub struct TomlSessionStore {
    path: PathBuf,
}

impl TomlSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location (`<config dir>/nodehost-cli/session.toml`)
    pub fn default_path() -> Result<Self> {
        let dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("nodehost-cli");

        Ok(Self::new(dir.join("session.toml")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionStore for TomlSessionStore {
    fn load(&self) -> nodehost_client::Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let session = toml::from_str(&content)
            .map_err(|e| NodehostError::Parse(format!("invalid session file: {e}")))?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> nodehost_client::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(session)
            .map_err(|e| NodehostError::Parse(format!("session serialization: {e}")))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> nodehost_client::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSessionStore::new(dir.path().join("session.toml"));

        assert_eq!(store.load().unwrap(), None);

        let session = Session::new(3, "alice");
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSessionStore::new(dir.path().join("nested/deeper/session.toml"));

        store.save(&Session::new(1, "bob")).unwrap();
        assert!(store.path().exists());
    }
}
