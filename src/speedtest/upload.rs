use super::error::Result;
use super::probe::{check_status, Transfer};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Instant;
use tracing::debug;

/// POST `bytes` zero bytes. Unlike downloads, the raw wall-clock time is
/// used; the server's timing header is not consulted.
pub async fn upload_probe(client: &Client, up_url: &str, bytes: u64) -> Result<Transfer> {
    let payload = vec![0u8; bytes as usize];

    let start = Instant::now();
    let response = client
        .post(up_url)
        .query(&[("measId", "0")])
        .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
        .header(ACCEPT, "*/*")
        .body(payload)
        .send()
        .await?;
    let response = check_status(response)?;
    response.bytes().await?;

    let transfer = Transfer {
        bytes,
        seconds: start.elapsed().as_secs_f64(),
    };
    debug!(
        bytes,
        seconds = transfer.seconds,
        bps = transfer.bits_per_second(),
        "Upload probe completed"
    );
    Ok(transfer)
}
