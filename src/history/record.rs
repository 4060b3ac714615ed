use crate::meta::ConnectionInfo;
use crate::speedtest::MeasurementReport;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// One stored measurement. Raw samples are not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub ip: String,
    #[serde(rename = "as")]
    pub as_identity: String,
    /// Bits per second.
    pub download_speed: u64,
    /// Bits per second.
    pub upload_speed: u64,
    /// Milliseconds.
    pub latency: u64,
}

impl MeasurementRecord {
    pub fn new(taken_at: DateTime<Local>, info: &ConnectionInfo, report: &MeasurementReport) -> Self {
        Self {
            timestamp: taken_at.timestamp(),
            ip: info.client_ip.clone(),
            as_identity: info.as_identity(),
            download_speed: report.download_speed_bps.round() as u64,
            upload_speed: report.upload_speed_bps.round() as u64,
            latency: report.latency_ms.round() as u64,
        }
    }

    pub fn taken_at(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.timestamp, 0).single()
    }

    /// `dd/mm/YYYY HH:MM:SS` in local time.
    pub fn formatted_date(&self) -> String {
        self.taken_at()
            .map(|t| t.format("%d/%m/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> MeasurementReport {
        MeasurementReport {
            download_speed_bps: 80_000_000.4,
            upload_speed_bps: 19_999_999.6,
            latency_ms: 5.5,
            jitter_ms: 1.0,
            download_samples: vec![80_000_000.4],
            upload_samples: vec![19_999_999.6],
            latency_samples: vec![5.0, 6.0],
        }
    }

    #[test]
    fn test_record_rounds_values() {
        let info = ConnectionInfo {
            client_ip: "198.51.100.1".to_string(),
            asn: 13335,
            as_organization: "Cloudflare, Inc.".to_string(),
        };
        let taken_at = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        let record = MeasurementRecord::new(taken_at, &info, &report());

        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.ip, "198.51.100.1");
        assert_eq!(record.as_identity, "AS13335 Cloudflare, Inc.");
        assert_eq!(record.download_speed, 80_000_000);
        assert_eq!(record.upload_speed, 20_000_000);
        assert_eq!(record.latency, 6);
    }

    #[test]
    fn test_record_serializes_as_key() {
        let record = MeasurementRecord {
            timestamp: 1,
            ip: "192.0.2.1".to_string(),
            as_identity: "AS1 Test".to_string(),
            download_speed: 2,
            upload_speed: 3,
            latency: 4,
        };
        let yaml = serde_yaml::to_string(&record).unwrap();
        assert!(yaml.contains("as: AS1 Test"));
        assert!(!yaml.contains("as_identity"));
    }
}
