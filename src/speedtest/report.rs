use super::error::Result;
use super::stats::{jitter, percentile};
use serde::Serialize;

/// Result of one engine run. Built once, after every sample is in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementReport {
    pub download_speed_bps: f64,
    pub upload_speed_bps: f64,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    pub download_samples: Vec<f64>,
    pub upload_samples: Vec<f64>,
    pub latency_samples: Vec<f64>,
}

impl MeasurementReport {
    /// Reduce raw samples: median latency, sample stdev as jitter, and the
    /// configured percentile of each direction's rates.
    pub fn from_samples(
        latency_samples: Vec<f64>,
        download_samples: Vec<f64>,
        upload_samples: Vec<f64>,
        speed_percentile: f64,
    ) -> Result<Self> {
        Ok(Self {
            download_speed_bps: percentile(&download_samples, speed_percentile)?,
            upload_speed_bps: percentile(&upload_samples, speed_percentile)?,
            latency_ms: percentile(&latency_samples, 50.0)?,
            jitter_ms: jitter(&latency_samples)?,
            download_samples,
            upload_samples,
            latency_samples,
        })
    }
}
