use crate::history::DEFAULT_DATA_DIR;
use crate::speedtest::config::{
    DEFAULT_LATENCY_PROBES, DEFAULT_PATIENCE_SECS, DEFAULT_PERCENTILE, DOWNLOAD_BASE_REPEAT,
    UPLOAD_BASE_REPEAT,
};
use crate::speedtest::probe::DEFAULT_SERVER;
use crate::speedtest::EngineConfig;
use crate::ui::theme::Theme;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "netsmon")]
#[command(about = "Measure your internet speed. Visualize your internet speed over time.")]
pub struct Cli {
    /// List all measurements
    #[arg(short = 'l', long = "list-measurements")]
    pub list_measurements: bool,

    /// Visualize your internet speed measurements
    #[arg(long, conflicts_with = "list_measurements")]
    pub visualize: bool,

    /// Set the visualization theme
    #[arg(long, value_enum, default_value_t = Theme::DarkMinimal)]
    pub theme: Theme,

    /// Run the test without the live dashboard and print a summary table
    #[arg(long)]
    pub plain: bool,

    /// Measurement server base URL
    #[arg(long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Directory holding measurements.yaml and the log file
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Percentile used to reduce throughput samples
    #[arg(long, default_value_t = DEFAULT_PERCENTILE)]
    pub percentile: f64,

    /// Seconds of projected transfer time tolerated per stage
    #[arg(long, default_value_t = DEFAULT_PATIENCE_SECS)]
    pub patience: f64,

    /// Number of recorded latency probes
    #[arg(long, default_value_t = DEFAULT_LATENCY_PROBES)]
    pub latency_probes: usize,

    /// Payload size ladder in bytes, smallest first
    #[arg(long, value_delimiter = ',')]
    pub sizes: Option<Vec<u64>>,

    /// Per-request timeout in seconds (none by default)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Measure { live: bool },
    List,
    Visualize,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub theme: Theme,
    pub server: String,
    pub data_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub log_level: String,
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Measure { live: true },
            theme: Theme::DarkMinimal,
            server: DEFAULT_SERVER.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeout: None,
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let mode = if cli.list_measurements {
            Mode::List
        } else if cli.visualize {
            Mode::Visualize
        } else {
            Mode::Measure { live: !cli.plain }
        };

        let defaults = EngineConfig::default();
        let settings = Self {
            mode,
            theme: cli.theme,
            server: cli.server,
            data_dir: cli.data_dir,
            timeout: cli.timeout.map(Duration::from_secs),
            log_level: cli.log_level,
            engine: EngineConfig {
                sizes: cli.sizes.unwrap_or(defaults.sizes),
                percentile: cli.percentile,
                patience: cli.patience,
                latency_probes: cli.latency_probes,
                download_base_repeat: DOWNLOAD_BASE_REPEAT,
                upload_base_repeat: UPLOAD_BASE_REPEAT,
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        self.engine.validate().context("Invalid measurement settings")?;
        if self.timeout == Some(Duration::ZERO) {
            anyhow::bail!("timeout must be > 0");
        }
        if !self.server.starts_with("http://") && !self.server.starts_with("https://") {
            anyhow::bail!("server must be an http(s) URL, got {}", self.server);
        }
        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("netsmon.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Settings> {
        let cli = Cli::try_parse_from(std::iter::once("netsmon").chain(args.iter().copied()))?;
        Settings::from_cli(cli)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let settings = parse(&[])?;
        assert_eq!(settings.mode, Mode::Measure { live: true });
        assert_eq!(settings.engine, EngineConfig::default());
        assert_eq!(settings.server, DEFAULT_SERVER);
        assert_eq!(settings.timeout, None);
        Ok(())
    }

    #[test]
    fn test_modes() -> Result<()> {
        assert_eq!(parse(&["-l"])?.mode, Mode::List);
        assert_eq!(parse(&["--visualize"])?.mode, Mode::Visualize);
        assert_eq!(parse(&["--plain"])?.mode, Mode::Measure { live: false });
        Ok(())
    }

    #[test]
    fn test_theme_and_overrides() -> Result<()> {
        let settings = parse(&[
            "--visualize",
            "--theme",
            "night_sky",
            "--sizes",
            "1000,2000",
            "--percentile",
            "75",
            "--patience",
            "5",
            "--timeout",
            "30",
        ])?;
        assert_eq!(settings.theme, Theme::NightSky);
        assert_eq!(settings.engine.sizes, vec![1000, 2000]);
        assert_eq!(settings.engine.percentile, 75.0);
        assert_eq!(settings.engine.patience, 5.0);
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
        Ok(())
    }

    #[test]
    fn test_validation_failures() {
        assert!(parse(&["--percentile", "0"]).is_err());
        assert!(parse(&["--sizes", "2000,1000"]).is_err());
        assert!(parse(&["--latency-probes", "1"]).is_err());
        assert!(parse(&["--timeout", "0"]).is_err());
        assert!(parse(&["--server", "ftp://example.com"]).is_err());
    }
}
