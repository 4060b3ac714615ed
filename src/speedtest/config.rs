use super::error::{Result, SpeedTestError};
use super::scheduler::Direction;

/// Payload sizes, smallest first, climbed by each direction's schedule.
pub const DEFAULT_SIZES: [u64; 6] = [
    100_000,
    1_000_000,
    10_000_000,
    25_000_000,
    100_000_000,
    250_000_000,
];

pub const DEFAULT_PERCENTILE: f64 = 90.0;
pub const DEFAULT_PATIENCE_SECS: f64 = 15.0;
pub const DEFAULT_LATENCY_PROBES: usize = 20;
pub const DOWNLOAD_BASE_REPEAT: i64 = 12;
pub const UPLOAD_BASE_REPEAT: i64 = 10;

/// Everything one engine run needs besides its transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sizes: Vec<u64>,
    /// Percentile used for interim estimates and final speeds.
    pub percentile: f64,
    /// Seconds of projected transfer time tolerated before a direction stops
    /// escalating.
    pub patience: f64,
    pub latency_probes: usize,
    pub download_base_repeat: i64,
    pub upload_base_repeat: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            percentile: DEFAULT_PERCENTILE,
            patience: DEFAULT_PATIENCE_SECS,
            latency_probes: DEFAULT_LATENCY_PROBES,
            download_base_repeat: DOWNLOAD_BASE_REPEAT,
            upload_base_repeat: UPLOAD_BASE_REPEAT,
        }
    }
}

impl EngineConfig {
    pub fn base_repeat(&self, direction: Direction) -> i64 {
        match direction {
            Direction::Download => self.download_base_repeat,
            Direction::Upload => self.upload_base_repeat,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.percentile > 0.0 && self.percentile <= 100.0) {
            return Err(SpeedTestError::InvalidInput(format!(
                "percentile must be in (0, 100], got {}",
                self.percentile
            )));
        }
        if !(self.patience.is_finite() && self.patience > 0.0) {
            return Err(SpeedTestError::InvalidInput(format!(
                "patience must be a positive number of seconds, got {}",
                self.patience
            )));
        }
        if self.latency_probes < 2 {
            return Err(SpeedTestError::InvalidInput(
                "at least 2 latency probes are needed to compute jitter".into(),
            ));
        }
        if self.sizes.is_empty() {
            return Err(SpeedTestError::InvalidInput("size ladder is empty".into()));
        }
        if self.sizes.contains(&0) {
            return Err(SpeedTestError::InvalidInput(
                "payload sizes must be positive".into(),
            ));
        }
        if self.sizes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SpeedTestError::InvalidInput(
                "size ladder must be strictly ascending".into(),
            ));
        }
        if self.download_base_repeat < 1 || self.upload_base_repeat < 1 {
            return Err(SpeedTestError::InvalidInput(
                "the first stage must issue at least one probe per direction".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            EngineConfig {
                percentile: 0.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                percentile: 101.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                patience: 0.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                latency_probes: 1,
                ..EngineConfig::default()
            },
            EngineConfig {
                sizes: vec![],
                ..EngineConfig::default()
            },
            EngineConfig {
                sizes: vec![10, 10],
                ..EngineConfig::default()
            },
            EngineConfig {
                sizes: vec![0, 10],
                ..EngineConfig::default()
            },
            EngineConfig {
                upload_base_repeat: 0,
                ..EngineConfig::default()
            },
        ];

        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }
}
