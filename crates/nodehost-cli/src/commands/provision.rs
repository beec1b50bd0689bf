//! Provisioning commands - VM setup and cancellation

use anyhow::Result;
use nodehost_client::{NodehostClient, SessionStore};

use crate::commands::require_session;
use crate::output::OutputContext;

/// Provision a VM for a project: instance setup, wallet generation, VPS setup
pub async fn provision(
    client: &NodehostClient,
    store: &impl SessionStore,
    project_id: i64,
    wallet_type: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let session = require_session(store)?;

    ctx.info("Requesting instance...");
    let setup = client.instance_setup(session.user_id, project_id).await?;
    ctx.info(&format!("Instance {} allocated", setup.instance_id));

    ctx.info("Generating wallet...");
    let wallet = client
        .generate_wallet(wallet_type, setup.user_project_id)
        .await?;

    ctx.info("Finalizing VPS setup...");
    let vps = client.vps_setup(setup.user_project_id).await?;

    ctx.print_kv(&[
        ("Instance", setup.instance_id),
        ("User project", setup.user_project_id.to_string()),
        ("Public key", wallet.public_key),
        ("Status", vps.status),
    ]);
    ctx.success("Provisioning started");
    Ok(())
}

/// Cancel a provisioned instance
pub async fn cancel(client: &NodehostClient, instance_id: &str, ctx: &OutputContext) -> Result<()> {
    let response = client.cancel_instance(instance_id).await?;

    ctx.success(&response.message);
    Ok(())
}
