use super::error::Result;
use super::probe::check_status;
use super::timing::server_time;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, warn};

/// One zero-byte download; returns the round trip in seconds minus the time
/// the server reports spending on the request.
pub async fn latency_probe(client: &Client, down_url: &str) -> Result<f64> {
    let start = Instant::now();
    let response = client
        .get(down_url)
        .query(&[("measId", "0"), ("bytes", "0")])
        .send()
        .await?;
    let response = check_status(response)?;
    let server_secs = server_time(response.headers())?;
    response.bytes().await?;

    let total_secs = start.elapsed().as_secs_f64();
    let net_secs = total_secs - server_secs;

    if net_secs < 0.0 {
        warn!(
            total_secs,
            server_secs, "Server time exceeds round trip, clamping latency to zero"
        );
        return Ok(0.0);
    }

    debug!(total_secs, server_secs, net_secs, "Latency probe completed");
    Ok(net_secs)
}
