//! Incremental consumption of streamed responses
//!
//! The server frames streamed output as newline- or blank-line-delimited
//! records, optionally prefixed with `data: `. One parser handles both
//! framings; the log and number streams are the two configurations of it.
//!
//! # Example
//!
//! ```no_run
//! use nodehost_client::NodehostClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NodehostClient::from_env()?;
//! let mut logs = client.stream_logs("10.0.0.5").await?;
//!
//! let cancel = logs.cancellation_token();
//! while let Some(line) = logs.next().await {
//!     println!("{}", line?);
//! }
//! // Elsewhere: cancel.cancel() ends the stream without an error.
//! # let _ = cancel;
//! # Ok(())
//! # }
//! ```

mod record;
mod stream;

pub use record::{Delimiter, RecordParser};
pub use stream::{LogStream, NumberStream, RecordStream, StreamError, StreamResult};
