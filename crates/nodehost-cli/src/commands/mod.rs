//! Command implementations for nodehost-cli

pub mod account;
pub mod logs;
pub mod projects;
pub mod provision;

pub use account::{login, logout, register, verify_email};
pub use logs::{logs, numbers};
pub use projects::{create_project, projects};
pub use provision::{cancel, provision};

use anyhow::{Context, Result};
use nodehost_client::{Session, SessionStore};

/// Fetch the stored session or fail with a login hint
pub fn require_session(store: &impl SessionStore) -> Result<Session> {
    store
        .load()
        .context("Failed to read session")?
        .context("Not logged in (run `nodehost-cli login` first)")
}
