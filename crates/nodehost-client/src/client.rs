//! Nodehost HTTP client implementation

use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{NodehostError, Result};
use crate::sign::{query_url, Signer};
use crate::streaming::{Delimiter, LogStream, NumberStream, RecordStream};
use crate::types::*;
use tokio_util::sync::CancellationToken;

/// Nodehost REST API client
///
/// Signs every request (HMAC-SHA256 over timestamp, method and URL) and
/// exposes one method per endpoint. No retries, no client-side business
/// logic: response bodies surface verbatim and failures surface as errors.
#[derive(Debug, Clone)]
pub struct NodehostClient {
    client: Client,
    base_url: Url,
    signer: Signer,
    timeout: std::time::Duration,
}

impl NodehostClient {
    /// Create a client from an explicit configuration.
    ///
    /// The request timeout applies to REST calls only; streaming responses
    /// stay open until the server closes them or the stream is cancelled.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            signer: Signer::new(config.app_secret),
            timeout: config.timeout,
        })
    }

    /// Create a client from `NODEHOST_API_URL` / `NODEHOST_APP_SECRET`.
    ///
    /// Fails immediately if either variable is missing.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Log in with email and password
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        self.signed_post("/login", json!({"email": email, "password": password}))
            .await
    }

    /// Register a new account
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse> {
        self.signed_post(
            "/register",
            json!({"username": username, "email": email, "password": password}),
        )
        .await
    }

    /// Confirm an email address with the token from the verification mail
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str, email: &str) -> Result<VerifyEmailResponse> {
        self.signed_get(
            "/verify_email",
            &[("token", token.to_string()), ("email", email.to_string())],
        )
        .await
    }

    // =========================================================================
    // Provisioning Operations
    // =========================================================================

    /// Start VM provisioning for a project; returns the user-project binding
    /// and the new instance id
    #[instrument(skip(self))]
    pub async fn instance_setup(
        &self,
        user_id: i64,
        project_id: i64,
    ) -> Result<InstanceSetupResponse> {
        self.signed_post(
            "/instance_setup",
            json!({"user_id": user_id, "project_id": project_id}),
        )
        .await
    }

    /// Generate a wallet for a provisioned project.
    ///
    /// Only the public key is returned; the private key stays server-side.
    #[instrument(skip(self))]
    pub async fn generate_wallet(
        &self,
        wallet_type: &str,
        user_project_id: i64,
    ) -> Result<WalletResponse> {
        self.signed_post(
            "/generate_wallet",
            json!({"wallet_type": wallet_type, "user_project_id": user_project_id}),
        )
        .await
    }

    /// Finalize project setup on the provisioned VM
    #[instrument(skip(self))]
    pub async fn vps_setup(&self, user_project_id: i64) -> Result<VpsSetupResponse> {
        self.signed_post("/vps_setup", json!({"user_project_id": user_project_id}))
            .await
    }

    /// Create a project record ahead of provisioning
    #[instrument(skip(self))]
    pub async fn create_project(
        &self,
        user_id: i64,
        project_id: i64,
        version: &str,
    ) -> Result<CreateProjectResponse> {
        self.signed_post(
            "/create_project",
            json!({"user_id": user_id, "project_id": project_id, "version": version}),
        )
        .await
    }

    /// Cancel a provisioned instance
    #[instrument(skip(self))]
    pub async fn cancel_instance(&self, instance_id: &str) -> Result<CancelInstanceResponse> {
        self.signed_post(
            &format!("/cancel_instance/{instance_id}"),
            json!({"instanceId": instance_id}),
        )
        .await
    }

    // =========================================================================
    // Dashboard Operations
    // =========================================================================

    /// List the projects provisioned for a user
    #[instrument(skip(self))]
    pub async fn user_projects(&self, user_id: i64) -> Result<Vec<UserProject>> {
        self.signed_get::<UserProjectsResponse>(
            "/user_projects",
            &[("user_id", user_id.to_string())],
        )
        .await
        .map(|r| r.data)
    }

    /// Fetch the status of a batch of instances.
    ///
    /// The ids travel as a single `params` query value in the
    /// `instance_ids[]=`-joined form the server expects.
    #[instrument(skip(self, instance_ids))]
    pub async fn instance_status(&self, instance_ids: &[&str]) -> Result<InstanceStatusResponse> {
        let batched = instance_ids
            .iter()
            .map(|id| format!("instance_ids[]={id}"))
            .collect::<Vec<_>>()
            .join("&");

        self.signed_get("/instance_status", &[("params", batched)])
            .await
    }

    // =========================================================================
    // Streaming Operations
    // =========================================================================

    /// Tail live log output from an instance.
    ///
    /// The returned stream yields one record per log line until the server
    /// closes the connection or the stream's token is cancelled.
    #[instrument(skip(self))]
    pub async fn stream_logs(&self, ip_address: &str) -> Result<LogStream> {
        self.stream_logs_with_token(ip_address, CancellationToken::new())
            .await
    }

    /// Tail live log output, cancellable through a caller-owned token.
    ///
    /// One stream per token: cancel an active stream before opening another
    /// with the same token.
    #[instrument(skip(self, token))]
    pub async fn stream_logs_with_token(
        &self,
        ip_address: &str,
        token: CancellationToken,
    ) -> Result<LogStream> {
        let url = query_url(
            &self.base_url,
            "/stream_logs",
            &[("ip_address", ip_address.to_string())],
        )?;
        let headers = self.signer.headers(&Method::GET, &url, None)?;

        let inner =
            RecordStream::connect(self.client.clone(), url, headers, Delimiter::Newline, token)
                .await?;
        Ok(LogStream::new(inner))
    }

    /// Open the numeric test stream (`GET /stream`)
    #[instrument(skip(self))]
    pub async fn stream_numbers(&self) -> Result<NumberStream> {
        let url = self.base_url.join("/stream")?;
        let headers = self.signer.headers(&Method::GET, &url, None)?;

        let inner = RecordStream::connect(
            self.client.clone(),
            url,
            headers,
            Delimiter::BlankLine,
            CancellationToken::new(),
        )
        .await?;
        Ok(NumberStream::new(inner))
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Issue a signed GET and deserialize the JSON response
    async fn signed_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = query_url(&self.base_url, path, params)?;
        let headers = self.signer.headers(&Method::GET, &url, None)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Issue a signed POST and deserialize the JSON response
    async fn signed_post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        let headers = self.signer.headers(&Method::POST, &url, Some(&body))?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Handle response and deserialize JSON
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| NodehostError::Parse(e.to_string()))
        } else {
            Err(self.extract_error(response, status).await)
        }
    }

    /// Extract the server's `{error: ...}` body from a failed response
    async fn extract_error(&self, response: reqwest::Response, status: StatusCode) -> NodehostError {
        let message = match response.json::<ErrorResponse>().await {
            Ok(err) => err.error,
            Err(_) => format!("HTTP {}", status),
        };

        NodehostError::server_error(status.as_u16(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:5000", SecretString::from("s3cr3t")).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = NodehostClient::new(config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url() {
        let client = NodehostClient::new(config()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/");
    }

    #[test]
    fn test_instance_status_batch_format() {
        let batched = ["vmi1", "vmi2"]
            .iter()
            .map(|id| format!("instance_ids[]={id}"))
            .collect::<Vec<_>>()
            .join("&");
        assert_eq!(batched, "instance_ids[]=vmi1&instance_ids[]=vmi2");
    }
}
