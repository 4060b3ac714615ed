use super::error::Result;
use super::probe::{check_status, Transfer};
use super::timing::server_time;
use futures::StreamExt;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, warn};

/// Fetch exactly `bytes` bytes. The elapsed time excludes server processing
/// time, the same subtraction the latency probe applies.
pub async fn download_probe(client: &Client, down_url: &str, bytes: u64) -> Result<Transfer> {
    let start = Instant::now();
    let response = client
        .get(down_url)
        .query(&[("measId", "0".to_string()), ("bytes", bytes.to_string())])
        .send()
        .await?;
    let response = check_status(response)?;
    let server_secs = server_time(response.headers())?;

    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;
    while let Some(chunk) = stream.next().await {
        received += chunk?.len() as u64;
    }

    let seconds = start.elapsed().as_secs_f64() - server_secs;

    if received != bytes {
        warn!(
            requested = bytes,
            received, "Download returned a different payload size than requested"
        );
    }
    if seconds <= 0.0 {
        warn!(bytes = received, server_secs, "Non-positive download time after subtracting server time");
    }

    let transfer = Transfer {
        bytes: received,
        seconds,
    };
    debug!(
        bytes = received,
        seconds,
        bps = transfer.bits_per_second(),
        "Download probe completed"
    );
    Ok(transfer)
}
