//! Account commands - register, login, logout, email verification

use anyhow::{Context, Result};
use nodehost_client::{NodehostClient, Session, SessionStore};

use crate::output::OutputContext;

/// Register a new account
pub async fn register(
    client: &NodehostClient,
    username: &str,
    email: &str,
    password: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let response = client.register(username, email, password).await?;

    ctx.print_kv(&[("User ID", response.user_id.to_string())]);
    ctx.success(
        response
            .message
            .as_deref()
            .unwrap_or("Registered; check your email to verify the account"),
    );
    Ok(())
}

/// Log in and persist the session
pub async fn login(
    client: &NodehostClient,
    store: &impl SessionStore,
    email: &str,
    password: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let response = client.login(email, password).await?;

    let session = Session::from(&response);
    store.save(&session).context("Failed to store session")?;

    ctx.success(&format!(
        "Logged in as {} (user {})",
        session.user_name, session.user_id
    ));
    Ok(())
}

/// Drop the persisted session
pub fn logout(store: &impl SessionStore, ctx: &OutputContext) -> Result<()> {
    store.clear().context("Failed to clear session")?;
    ctx.success("Logged out");
    Ok(())
}

/// Confirm an email address with the token from the verification mail
pub async fn verify_email(
    client: &NodehostClient,
    token: &str,
    email: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let response = client.verify_email(token, email).await?;

    ctx.success(&response.status);
    Ok(())
}
