//! Cancellable record streams over chunked HTTP responses

use std::collections::VecDeque;
use std::future::Future as _;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::Client;
use thiserror::Error;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;
use url::Url;

use super::record::{Delimiter, RecordParser};

/// Errors that can occur while streaming
#[derive(Debug, Error)]
pub enum StreamError {
    /// HTTP/connection error
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Server rejected the stream request
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Result type for streaming operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// An open, incrementally-parsed streaming response
///
/// Implements `Stream<Item = StreamResult<String>>`, one item per record.
///
/// # Lifecycle
///
/// - Created via [`NodehostClient::stream_logs`](crate::NodehostClient::stream_logs)
///   or [`NodehostClient::stream_numbers`](crate::NodehostClient::stream_numbers)
/// - Records are consumed via `next()` or the `Stream` trait
/// - Cancelling the token ends the stream and drops the transport; this is a
///   normal stop, not an error
///
/// One stream per token: a consumer that wants a fresh stream cancels the
/// old token first.
pub struct RecordStream {
    byte_stream: Option<Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>>,
    parser: RecordParser,
    pending: VecDeque<String>,
    token: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("parser", &self.parser)
            .field("pending", &self.pending.len())
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl RecordStream {
    /// Open the streaming request and wrap its body.
    pub(crate) async fn connect(
        client: Client,
        url: Url,
        headers: HeaderMap,
        delimiter: Delimiter,
        token: CancellationToken,
    ) -> StreamResult<Self> {
        debug!("Connecting to stream: {}", url);

        let response = client.get(url).headers(headers).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StreamError::Server { status, message });
        }

        Ok(Self {
            byte_stream: Some(Box::pin(response.bytes_stream())),
            parser: RecordParser::new(delimiter),
            pending: VecDeque::new(),
            cancelled: Box::pin(token.clone().cancelled_owned()),
            token,
        })
    }

    /// A handle that cancels this stream when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Stream for RecordStream {
    type Item = StreamResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            // Cancellation ends the stream cleanly and registers a waker so
            // a cancel from another task wakes the consumer.
            if this.cancelled.as_mut().poll(cx).is_ready() {
                this.byte_stream = None;
                return Poll::Ready(None);
            }

            if let Some(record) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(record)));
            }

            let Some(byte_stream) = this.byte_stream.as_mut() else {
                return Poll::Ready(None);
            };

            match byte_stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending.extend(this.parser.feed(&bytes));
                }
                Poll::Ready(Some(Err(e))) => {
                    this.byte_stream = None;
                    if this.token.is_cancelled() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Err(StreamError::Connection(e))));
                }
                Poll::Ready(None) => {
                    this.byte_stream = None;
                    if let Some(rest) = this.parser.finish() {
                        this.pending.push_back(rest);
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Live log output from a provisioned instance (`GET /stream_logs`)
#[derive(Debug)]
pub struct LogStream {
    inner: RecordStream,
}

impl LogStream {
    pub(crate) fn new(inner: RecordStream) -> Self {
        Self { inner }
    }

    /// A handle that cancels this stream when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancellation_token()
    }

    /// Get the next log record.
    ///
    /// Returns `None` when the stream ends or is cancelled.
    pub async fn next(&mut self) -> Option<StreamResult<String>> {
        StreamExt::next(&mut self.inner).await
    }

    /// Drive the stream to completion, invoking `on_record` per record.
    ///
    /// Cancellation resolves to `Ok(())`; transport failures surface.
    pub async fn for_each_record<F>(mut self, mut on_record: F) -> StreamResult<()>
    where
        F: FnMut(String),
    {
        while let Some(record) = self.next().await {
            on_record(record?);
        }
        Ok(())
    }
}

impl Stream for LogStream {
    type Item = StreamResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Streamed integers from the `/stream` endpoint
///
/// Records that do not parse as integers are dropped silently.
#[derive(Debug)]
pub struct NumberStream {
    inner: RecordStream,
}

impl NumberStream {
    pub(crate) fn new(inner: RecordStream) -> Self {
        Self { inner }
    }

    /// A handle that cancels this stream when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancellation_token()
    }

    /// Get the next number.
    pub async fn next(&mut self) -> Option<StreamResult<i64>> {
        StreamExt::next(self).await
    }
}

impl Stream for NumberStream {
    type Item = StreamResult<i64>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(record))) => match record.parse::<i64>() {
                    Ok(number) => return Poll::Ready(Some(Ok(number))),
                    Err(_) => continue,
                },
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
