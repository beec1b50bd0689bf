//! Project commands - dashboard listing and project creation

use anyhow::Result;
use nodehost_client::{NodehostClient, SessionStore, UserProject};

use crate::commands::require_session;
use crate::output::{OutputContext, ProjectRow};

/// List provisioned projects, annotated with live instance status
pub async fn projects(
    client: &NodehostClient,
    store: &impl SessionStore,
    ctx: &OutputContext,
) -> Result<()> {
    let session = require_session(store)?;
    let projects = client.user_projects(session.user_id).await?;

    if projects.is_empty() {
        ctx.info("No provisioned projects");
        return Ok(());
    }

    // Status lookups are best-effort; the listing stays useful without them.
    let ids: Vec<&str> = projects.iter().map(|p| p.instance_id.as_str()).collect();
    let statuses = match client.instance_status(&ids).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("instance status lookup failed: {e}");
            Default::default()
        }
    };

    let rows: Vec<ProjectRow> = projects
        .iter()
        .map(|p| project_row(p, statuses.status_of(&p.instance_id)))
        .collect();

    ctx.print(&rows);
    Ok(())
}

/// Create a project record ahead of provisioning
pub async fn create_project(
    client: &NodehostClient,
    store: &impl SessionStore,
    project_id: i64,
    version: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let session = require_session(store)?;
    let response = client
        .create_project(session.user_id, project_id, version)
        .await?;

    ctx.print_kv(&[("Project ID", response.project_id.to_string())]);
    ctx.success("Project created");
    Ok(())
}

fn project_row(project: &UserProject, status: Option<&str>) -> ProjectRow {
    ProjectRow {
        instance_id: project.instance_id.clone(),
        project_name: project.project_name.clone(),
        version: project.version.clone().unwrap_or_else(|| "-".to_string()),
        network: project.network.clone().unwrap_or_else(|| "-".to_string()),
        ip_address: project
            .ip_address
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        status: status.unwrap_or("unknown").to_string(),
    }
}
