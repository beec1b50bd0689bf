//! Test utilities for nodehost-client
//!
//! Provides a signature-verifying mock of the nodehost API plus a
//! [`TestServer`] that serves any axum router on an ephemeral port and shuts
//! down when dropped.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::config::ClientConfig;
use crate::sign::{signature_base, Signer, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::{NodehostClient, Result};

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve a router on an ephemeral local port.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let server = TestServer::start(MockApi::new("s3cr3t").into_router()).await?;
    /// let client = server.client("s3cr3t")?;
    /// let projects = client.user_projects(1).await?;
    /// ```
    pub async fn start(router: Router) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Build a client pointed at this server
    pub fn client(&self, secret: &str) -> Result<NodehostClient> {
        let config = ClientConfig::new(&self.base_url(), SecretString::from(secret))?
            .with_timeouts(Duration::from_secs(5), Duration::from_secs(2));
        NodehostClient::new(config)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Canned mock of the nodehost API with real signature verification
#[derive(Debug, Clone)]
pub struct MockApi {
    secret: String,
    log_lines: Vec<String>,
    stream_records: Vec<String>,
}

impl MockApi {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            log_lines: vec![
                "starting node".to_string(),
                "syncing headers".to_string(),
                "node ready".to_string(),
            ],
            stream_records: (1..=5).map(|n| n.to_string()).collect(),
        }
    }

    /// Override the records served by `/stream_logs`
    #[must_use]
    pub fn with_log_lines(mut self, lines: Vec<String>) -> Self {
        self.log_lines = lines;
        self
    }

    /// Override the records served by `/stream`
    #[must_use]
    pub fn with_stream_records(mut self, records: Vec<String>) -> Self {
        self.stream_records = records;
        self
    }

    /// Build the axum router serving this mock
    pub fn into_router(self) -> Router {
        let state = Arc::new(self);

        Router::new()
            .route("/login", post(login))
            .route("/register", post(register))
            .route("/verify_email", get(verify_email))
            .route("/instance_setup", post(instance_setup))
            .route("/generate_wallet", post(generate_wallet))
            .route("/vps_setup", post(vps_setup))
            .route("/create_project", post(create_project))
            .route("/cancel_instance/{instance_id}", post(cancel_instance))
            .route("/user_projects", get(user_projects))
            .route("/instance_status", get(instance_status))
            .route("/stream_logs", get(stream_logs))
            .route("/stream", get(stream_numbers))
            .with_state(state)
    }
}

/// Recompute the signature the way the real backend does and compare.
fn verified(
    api: &MockApi,
    headers: &HeaderMap,
    method: Method,
    uri: &Uri,
    body: Option<&Value>,
) -> bool {
    let Some(timestamp) = header_value(headers, TIMESTAMP_HEADER) else {
        return false;
    };
    let Some(provided) = header_value(headers, SIGNATURE_HEADER) else {
        return false;
    };
    let Ok(timestamp) = timestamp.parse::<u64>() else {
        return false;
    };
    let Some(host) = header_value(headers, "host") else {
        return false;
    };

    let full_url = format!("http://{host}{uri}");
    let base = signature_base(timestamp, &method, &full_url, body);

    let signer = Signer::new(SecretString::from(api.secret.clone()));
    match signer.sign(&base) {
        Ok(expected) => expected == provided,
        Err(_) => false,
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid signature"})),
    )
        .into_response()
}

async fn login(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !verified(&api, &headers, Method::POST, &uri, Some(&body)) {
        return unauthorized();
    }
    if body.get("email").is_none() || body.get("password").is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Email and password are required"})),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Login successful",
            "user_id": 3,
            "user_name": "alice"
        })),
    )
        .into_response()
}

async fn register(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !verified(&api, &headers, Method::POST, &uri, Some(&body)) {
        return unauthorized();
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully. Please check your email to verify your account.",
            "userId": 7
        })),
    )
        .into_response()
}

async fn verify_email(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !verified(&api, &headers, Method::GET, &uri, None) {
        return unauthorized();
    }
    if !params.contains_key("token") || !params.contains_key("email") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Both token and email are required"})),
        )
            .into_response();
    }

    (
        StatusCode::ACCEPTED,
        Json(json!({"status": "Successfully verified"})),
    )
        .into_response()
}

async fn instance_setup(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !verified(&api, &headers, Method::POST, &uri, Some(&body)) {
        return unauthorized();
    }

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Instance created",
            "user_project_id": 11,
            "instance_id": "vmi-1001"
        })),
    )
        .into_response()
}

async fn generate_wallet(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !verified(&api, &headers, Method::POST, &uri, Some(&body)) {
        return unauthorized();
    }
    if body.get("wallet_type").is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Wallet type is required"})),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Wallet generated successfully",
            "public_key": "mock-public-key"
        })),
    )
        .into_response()
}

async fn vps_setup(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !verified(&api, &headers, Method::POST, &uri, Some(&body)) {
        return unauthorized();
    }

    (
        StatusCode::ACCEPTED,
        Json(json!({"status": "Instance created, setup started"})),
    )
        .into_response()
}

async fn create_project(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !verified(&api, &headers, Method::POST, &uri, Some(&body)) {
        return unauthorized();
    }

    (StatusCode::CREATED, Json(json!({"project_id": 5}))).into_response()
}

async fn cancel_instance(
    State(api): State<Arc<MockApi>>,
    Path(instance_id): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if !verified(&api, &headers, Method::POST, &uri, Some(&body)) {
        return unauthorized();
    }

    (
        StatusCode::OK,
        Json(json!({
            "message": format!("Instance {instance_id} cancelled successfully")
        })),
    )
        .into_response()
}

async fn user_projects(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !verified(&api, &headers, Method::GET, &uri, None) {
        return unauthorized();
    }
    if !params.contains_key("user_id") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "User ID is required"})),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(json!({
            "message": "User project data successfully fetched",
            "data": [
                {
                    "id": 1,
                    "project_id": 9,
                    "instance_id": "vmi-1001",
                    "project_name": "mainnet-node",
                    "version": "1.4.2",
                    "network": "mainnet",
                    "creation_date": "2024-05-01 12:00:00",
                    "ip_address": "10.0.0.5",
                    "public_key": "mock-public-key"
                },
                {
                    "id": 2,
                    "project_id": 9,
                    "instance_id": "vmi-1002",
                    "project_name": "testnet-node"
                }
            ]
        })),
    )
        .into_response()
}

async fn instance_status(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !verified(&api, &headers, Method::GET, &uri, None) {
        return unauthorized();
    }

    // The batch travels as one `params` value of `instance_ids[]=`-joined ids.
    let Some(batched) = params.get("params") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "No instance IDs provided"})),
        )
            .into_response();
    };

    let statuses: Vec<Value> = batched
        .split("instance_ids[]=")
        .map(|id| id.trim_end_matches('&'))
        .filter(|id| !id.is_empty())
        .map(|id| json!({"instanceId": id, "status": "running"}))
        .collect();

    (
        StatusCode::OK,
        Json(json!({"statuses": statuses, "errors": []})),
    )
        .into_response()
}

async fn stream_logs(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !verified(&api, &headers, Method::GET, &uri, None) {
        return unauthorized();
    }
    if !params.contains_key("ip_address") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid Request, missing IP"})),
        )
            .into_response();
    }

    sse_body(api.log_lines.clone())
}

async fn stream_numbers(State(api): State<Arc<MockApi>>, headers: HeaderMap, uri: Uri) -> Response {
    if !verified(&api, &headers, Method::GET, &uri, None) {
        return unauthorized();
    }

    sse_body(api.stream_records.clone())
}

/// Emit records as `data: <record>\n\n` chunks with small pauses so clients
/// observe incremental delivery.
fn sse_body(records: Vec<String>) -> Response {
    let stream = async_stream::stream! {
        for record in records {
            yield Ok::<Bytes, std::io::Error>(Bytes::from(format!("data: {record}\n\n")));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_format() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let url = format!("http://{}", addr);
        assert_eq!(url, "http://127.0.0.1:8080");
    }
}
