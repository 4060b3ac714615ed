//! Connection metadata lookup (client IP and autonomous system).

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub client_ip: String,
    pub asn: u32,
    #[serde(default)]
    pub as_organization: String,
}

impl ConnectionInfo {
    /// Autonomous system identity, e.g. `AS13335 Cloudflare, Inc.`
    pub fn as_identity(&self) -> String {
        format!("AS{} {}", self.asn, self.as_organization)
    }
}

pub async fn fetch_connection_info(client: &Client, server: &str) -> Result<ConnectionInfo> {
    let url = format!("{}/meta", server.trim_end_matches('/'));
    debug!(url = %url, "Fetching connection metadata");

    let info = client
        .get(&url)
        .send()
        .await
        .context("Failed to reach metadata endpoint")?
        .error_for_status()
        .context("Metadata endpoint returned an error")?
        .json::<ConnectionInfo>()
        .await
        .context("Failed to parse connection metadata")?;

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_identity() {
        let info = ConnectionInfo {
            client_ip: "203.0.113.7".to_string(),
            asn: 64500,
            as_organization: "Example Net".to_string(),
        };
        assert_eq!(info.as_identity(), "AS64500 Example Net");
    }
}
