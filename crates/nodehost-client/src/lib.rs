//! Nodehost Client Library
//!
//! Provides a typed, request-signing HTTP client for the nodehost
//! provisioning API, including its streaming endpoints.
//!
//! Every request (except CORS preflights) is authenticated with an
//! HMAC-SHA256 signature over the timestamp, method, URL and body, carried in
//! `X-Timestamp` / `X-Signature` headers.
//!
//! # Example
//!
//! ```rust,no_run
//! use nodehost_client::NodehostClient;
//!
//! #[tokio::main]
//! async fn main() -> nodehost_client::Result<()> {
//!     // Reads NODEHOST_API_URL and NODEHOST_APP_SECRET
//!     let client = NodehostClient::from_env()?;
//!
//!     let login = client.login("dev@example.com", "password").await?;
//!     let projects = client.user_projects(login.user_id).await?;
//!
//!     for project in &projects {
//!         println!("{}: {}", project.project_name, project.instance_id);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! Log tailing yields one record at a time and stops cleanly when its
//! cancellation token fires:
//!
//! ```rust,ignore
//! let mut logs = client.stream_logs("10.0.0.5").await?;
//! let token = logs.cancellation_token();
//!
//! while let Some(record) = logs.next().await {
//!     println!("{}", record?);
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a signature-verifying mock API and an
//! ephemeral-port test server:
//!
//! ```rust,ignore
//! use nodehost_client::testing::{MockApi, TestServer};
//!
//! let server = TestServer::start(MockApi::new("s3cr3t").into_router()).await?;
//! let client = server.client("s3cr3t")?;
//! let projects = client.user_projects(1).await?;
//! ```

mod client;
pub mod config;
mod error;
pub mod session;
pub mod sign;
pub mod streaming;
pub mod testing;
mod types;

pub use client::NodehostClient;
pub use config::ClientConfig;
pub use error::{NodehostError, Result};
pub use types::*;

// Re-export session handling for convenience
pub use session::{MemorySessionStore, Session, SessionStore};

// Re-export signing primitives for convenience
pub use sign::Signer;

// Re-export streaming types for convenience
pub use streaming::{Delimiter, LogStream, NumberStream, StreamError, StreamResult};

// Re-export so stream consumers don't need a direct tokio-util dependency
pub use tokio_util::sync::CancellationToken;
