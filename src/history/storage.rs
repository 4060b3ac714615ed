//! Measurement history kept as a YAML list in a single file.

use super::record::MeasurementRecord;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_DATA_DIR: &str = "./netsmon_data";
pub const MEASUREMENTS_FILE: &str = "measurements.yaml";

pub struct MeasurementStore {
    data_dir: PathBuf,
}

impl MeasurementStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(MEASUREMENTS_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Load every stored record. A missing file is an error; an empty file
    /// holds no records.
    pub fn load(&self) -> Result<Vec<MeasurementRecord>> {
        let path = self.path();
        if !path.exists() {
            bail!("Measurements file not found: {}", path.display());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Option<Vec<MeasurementRecord>> = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let records = records.unwrap_or_default();
        debug!(count = records.len(), path = %path.display(), "Loaded measurements");
        Ok(records)
    }

    /// Append a record, creating the data directory and file on first use.
    pub fn append(&self, record: MeasurementRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory {}", self.data_dir.display())
        })?;

        let mut records = if self.exists() {
            self.load()?
        } else {
            Vec::new()
        };
        records.push(record);

        let path = self.path();
        let content = serde_yaml::to_string(&records).context("Failed to serialize measurements")?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

        info!(count = records.len(), path = %path.display(), "Saved measurement");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(timestamp: i64) -> MeasurementRecord {
        MeasurementRecord {
            timestamp,
            ip: "192.0.2.10".to_string(),
            as_identity: "AS64496 Example".to_string(),
            download_speed: 100_000_000,
            upload_speed: 20_000_000,
            latency: 12,
        }
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let store = MeasurementStore::new(dir.path());
        assert!(store.load().is_err());
    }

    #[test]
    fn test_append_creates_directory_and_file() -> Result<()> {
        let dir = TempDir::new()?;
        let store = MeasurementStore::new(dir.path().join("nested"));

        let path = store.append(record(1))?;
        assert!(path.exists());
        assert_eq!(store.load()?, vec![record(1)]);
        Ok(())
    }

    #[test]
    fn test_append_keeps_existing_records() -> Result<()> {
        let dir = TempDir::new()?;
        let store = MeasurementStore::new(dir.path());

        store.append(record(1))?;
        store.append(record(2))?;
        store.append(record(3))?;

        let timestamps: Vec<i64> = store.load()?.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_empty_file_has_no_records() -> Result<()> {
        let dir = TempDir::new()?;
        let store = MeasurementStore::new(dir.path());
        fs::write(store.path(), "")?;
        assert!(store.load()?.is_empty());

        fs::write(store.path(), "null\n")?;
        assert!(store.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_reads_hand_written_history() -> Result<()> {
        let dir = TempDir::new()?;
        let store = MeasurementStore::new(dir.path());
        fs::write(
            store.path(),
            "- as: AS13335 Cloudflare, Inc.\n  download_speed: 93000000\n  ip: 198.51.100.4\n  latency: 9\n  timestamp: 1700000000\n  upload_speed: 41000000\n",
        )?;

        let records = store.load()?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_identity, "AS13335 Cloudflare, Inc.");
        assert_eq!(records[0].download_speed, 93_000_000);
        Ok(())
    }
}
