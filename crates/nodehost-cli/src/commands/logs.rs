//! Streaming commands - live log tailing and the numeric test stream

use anyhow::Result;
use nodehost_client::NodehostClient;

use crate::output::OutputContext;

/// Tail live logs from an instance until Ctrl+C or the server closes
pub async fn logs(client: &NodehostClient, ip_address: &str, ctx: &OutputContext) -> Result<()> {
    ctx.info(&format!("Streaming logs from {ip_address}..."));
    ctx.info("Press Ctrl+C to stop");

    let logs = client.stream_logs(ip_address).await?;

    // Ctrl+C cancels the stream, which ends it as a normal stop
    let token = logs.cancellation_token();
    ctrlc::set_handler(move || {
        token.cancel();
    })?;

    let result = logs.for_each_record(|line| println!("{line}")).await;

    match result {
        Ok(()) => {
            ctx.success("Stream ended");
            Ok(())
        }
        Err(e) => {
            ctx.error(&format!("Stream error: {e}"));
            Err(e.into())
        }
    }
}

/// Consume the numeric test stream and print each number
pub async fn numbers(client: &NodehostClient, ctx: &OutputContext) -> Result<()> {
    let mut numbers = client.stream_numbers().await?;

    let token = numbers.cancellation_token();
    ctrlc::set_handler(move || {
        token.cancel();
    })?;

    while let Some(number) = numbers.next().await {
        println!("{}", number?);
    }

    ctx.success("Stream ended");
    Ok(())
}
