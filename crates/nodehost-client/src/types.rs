//! Request and response types for the nodehost API
//!
//! Shapes mirror the server's JSON verbatim; the client adds no fields and
//! performs no validation beyond deserialization.

use serde::{Deserialize, Serialize};

// =============================================================================
// Auth
// =============================================================================

/// Response to `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user_id: i64,
    pub user_name: String,
}

/// Response to `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Response to `GET /verify_email`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailResponse {
    pub status: String,
}

// =============================================================================
// Provisioning
// =============================================================================

/// Response to `POST /instance_setup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSetupResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user_project_id: i64,
    pub instance_id: String,
}

/// Response to `POST /generate_wallet`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub public_key: String,
}

/// Response to `POST /vps_setup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpsSetupResponse {
    pub status: String,
}

/// Response to `POST /create_project`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    pub project_id: i64,
}

/// Response to `POST /cancel_instance/{instance_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelInstanceResponse {
    pub message: String,
}

// =============================================================================
// Projects / Instances
// =============================================================================

/// A provisioned project instance as returned by `GET /user_projects`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProject {
    pub id: i64,
    pub project_id: i64,
    pub instance_id: String,
    pub project_name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub last_modified_date: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    /// Not returned by all deployments; never logged
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Envelope for `GET /user_projects`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProjectsResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub data: Vec<UserProject>,
}

/// Status of a single instance in a `GET /instance_status` batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatus {
    #[serde(rename = "instanceId")]
    pub instance_id: String,
    pub status: String,
}

/// Per-instance failure in a `GET /instance_status` batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatusError {
    #[serde(rename = "instanceId")]
    pub instance_id: String,
    pub error: String,
}

/// Response to `GET /instance_status`; partial success is normal, failed
/// lookups land in `errors` rather than failing the whole batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceStatusResponse {
    #[serde(default)]
    pub statuses: Vec<InstanceStatus>,
    #[serde(default)]
    pub errors: Vec<InstanceStatusError>,
}

impl InstanceStatusResponse {
    /// Look up the status reported for an instance id
    pub fn status_of(&self, instance_id: &str) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.instance_id == instance_id)
            .map(|s| s.status.as_str())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error body returned by the server on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
