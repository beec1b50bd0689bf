//! Streaming integration tests
//!
//! Drive the client's streaming endpoints against the mock API, including
//! chunk boundaries that split records and mid-stream cancellation.

use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use nodehost_client::testing::{MockApi, TestServer};
use nodehost_client::{NodehostError, StreamError};

const SECRET: &str = "s3cr3t";

#[tokio::test]
async fn test_stream_logs_collects_records() {
    let server = TestServer::start(MockApi::new(SECRET).into_router())
        .await
        .unwrap();
    let client = server.client(SECRET).unwrap();

    let logs = client.stream_logs("10.0.0.5").await.unwrap();
    let mut collected = Vec::new();
    logs.for_each_record(|record| collected.push(record))
        .await
        .unwrap();

    assert_eq!(collected, vec!["starting node", "syncing headers", "node ready"]);
}

#[tokio::test]
async fn test_stream_logs_custom_lines() {
    let mock = MockApi::new(SECRET)
        .with_log_lines(vec!["block 100 sealed".to_string(), "peer connected".to_string()]);
    let server = TestServer::start(mock.into_router()).await.unwrap();
    let client = server.client(SECRET).unwrap();

    let mut logs = client.stream_logs("10.0.0.5").await.unwrap();
    assert!(format!("{logs:?}").contains("LogStream"));

    assert_eq!(logs.next().await.unwrap().unwrap(), "block 100 sealed");
    assert_eq!(logs.next().await.unwrap().unwrap(), "peer connected");
    assert!(logs.next().await.is_none());
}

#[tokio::test]
async fn test_stream_rejected_without_valid_signature() {
    let server = TestServer::start(MockApi::new(SECRET).into_router())
        .await
        .unwrap();
    let client = server.client("wrong-secret").unwrap();

    let err = client.stream_logs("10.0.0.5").await.unwrap_err();
    match err {
        NodehostError::Stream(StreamError::Server { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected stream server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancellation_ends_stream_without_error() {
    // A long stream the test never drains; cancelling must end it cleanly.
    let lines: Vec<String> = (0..500).map(|n| format!("log line {n}")).collect();
    let server = TestServer::start(MockApi::new(SECRET).with_log_lines(lines).into_router())
        .await
        .unwrap();
    let client = server.client(SECRET).unwrap();

    let mut logs = client.stream_logs("10.0.0.5").await.unwrap();
    let token = logs.cancellation_token();

    for _ in 0..3 {
        let record = logs.next().await.expect("stream should be live");
        record.unwrap();
    }

    token.cancel();

    // Cancellation is a normal end of stream, not an error.
    assert!(logs.next().await.is_none());
    assert!(logs.next().await.is_none());
}

#[tokio::test]
async fn test_cancel_from_another_task_wakes_consumer() {
    let lines: Vec<String> = (0..500).map(|n| format!("log line {n}")).collect();
    let server = TestServer::start(MockApi::new(SECRET).with_log_lines(lines).into_router())
        .await
        .unwrap();
    let client = server.client(SECRET).unwrap();

    let logs = client.stream_logs("10.0.0.5").await.unwrap();
    let token = logs.cancellation_token();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let result = logs.for_each_record(|_| {}).await;
    assert!(result.is_ok());
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_number_stream_skips_non_numeric_records() {
    let mock = MockApi::new(SECRET).with_stream_records(vec![
        "1".to_string(),
        "oops".to_string(),
        "3".to_string(),
    ]);
    let server = TestServer::start(mock.into_router()).await.unwrap();
    let client = server.client(SECRET).unwrap();

    let mut numbers = client.stream_numbers().await.unwrap();

    assert_eq!(numbers.next().await.unwrap().unwrap(), 1);
    assert_eq!(numbers.next().await.unwrap().unwrap(), 3);
    assert!(numbers.next().await.is_none());
}

// =============================================================================
// Chunk boundaries
// =============================================================================

/// Serves a fixed chunk sequence so a record straddles the boundary.
fn split_chunk_router() -> Router {
    async fn handler() -> Response {
        let stream = async_stream::stream! {
            yield Ok::<Bytes, std::io::Error>(Bytes::from_static(b"data: 1\ndata: "));
            tokio::time::sleep(Duration::from_millis(20)).await;
            yield Ok(Bytes::from_static(b"2\ndata: 3\n"));
        };

        Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "text/event-stream")
            .body(Body::from_stream(stream))
            .unwrap()
    }

    Router::new().route("/stream_logs", get(handler))
}

#[tokio::test]
async fn test_record_split_across_chunks() {
    let server = TestServer::start(split_chunk_router()).await.unwrap();
    let client = server.client(SECRET).unwrap();

    let logs = client.stream_logs("10.0.0.5").await.unwrap();
    let mut collected = Vec::new();
    logs.for_each_record(|record| collected.push(record))
        .await
        .unwrap();

    // "2" must not be emitted as a partial before its delimiter arrives.
    assert_eq!(collected, vec!["1", "2", "3"]);
}
