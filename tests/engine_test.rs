use async_trait::async_trait;
use netsmon::speedtest::{
    Direction, EngineConfig, Probe, Progress, Result, SpeedTest, SpeedTestError, Transfer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Probe with scripted timings: a fixed net latency and a fixed rate per
/// direction.
struct ScriptedProbe {
    latency_secs: f64,
    download_bps: f64,
    upload_bps: f64,
    fail_upload: bool,
    latency_calls: AtomicUsize,
    download_sizes: Mutex<Vec<u64>>,
    upload_sizes: Mutex<Vec<u64>>,
}

impl ScriptedProbe {
    fn new(latency_secs: f64, download_bps: f64, upload_bps: f64) -> Self {
        Self {
            latency_secs,
            download_bps,
            upload_bps,
            fail_upload: false,
            latency_calls: AtomicUsize::new(0),
            download_sizes: Mutex::new(Vec::new()),
            upload_sizes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn latency(&self) -> Result<f64> {
        self.latency_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.latency_secs)
    }

    async fn download(&self, bytes: u64) -> Result<Transfer> {
        self.download_sizes.lock().unwrap().push(bytes);
        Ok(Transfer {
            bytes,
            seconds: bytes as f64 * 8.0 / self.download_bps,
        })
    }

    async fn upload(&self, bytes: u64) -> Result<Transfer> {
        if self.fail_upload {
            return Err(SpeedTestError::Status {
                url: "http://127.0.0.1/__up".to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        self.upload_sizes.lock().unwrap().push(bytes);
        Ok(Transfer {
            bytes,
            seconds: bytes as f64 * 8.0 / self.upload_bps,
        })
    }
}

fn single_stage_config() -> EngineConfig {
    EngineConfig {
        sizes: vec![10_000_000],
        download_base_repeat: 1,
        upload_base_repeat: 1,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_single_stage_run_is_deterministic() -> Result<()> {
    // 15 ms round trip minus 10 ms server time.
    let probe = ScriptedProbe::new(0.015 - 0.010, 80_000_000.0, 40_000_000.0);
    let engine = SpeedTest::new(probe, single_stage_config());

    let report = engine.run_standard_test().await?;

    assert_eq!(report.download_speed_bps, 80_000_000.0);
    assert_eq!(report.upload_speed_bps, 40_000_000.0);
    assert!((report.latency_ms - 5.0).abs() < 1e-9);
    assert!(report.jitter_ms.abs() < 1e-9);
    assert_eq!(report.download_samples.len(), 1);
    assert_eq!(report.upload_samples.len(), 1);
    assert_eq!(report.latency_samples.len(), 20);
    Ok(())
}

#[tokio::test]
async fn test_warmup_probe_is_not_recorded() -> Result<()> {
    let engine = SpeedTest::new(
        ScriptedProbe::new(0.005, 1e8, 1e8),
        EngineConfig {
            latency_probes: 5,
            ..single_stage_config()
        },
    );

    let report = engine.run_standard_test().await?;
    assert_eq!(report.latency_samples.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_directions_stop_independently() -> Result<()> {
    let config = EngineConfig {
        sizes: vec![100_000, 1_000_000, 10_000_000],
        ..EngineConfig::default()
    };
    // Download at 1 Mb/s cannot afford stage 1 (80 Mb in 15 s); upload at
    // 1 Gb/s climbs the whole ladder.
    let (progress_tx, mut progress_rx) = mpsc::channel(1024);
    let engine = SpeedTest::new(ScriptedProbe::new(0.005, 1e6, 1e9), config)
        .with_progress(progress_tx);

    let report = engine.run_standard_test().await?;
    drop(engine);

    assert_eq!(report.download_samples.len(), 12);
    assert_eq!(report.upload_samples.len(), 10 + 8 + 6);

    let mut stopped = Vec::new();
    let mut started = Vec::new();
    while let Some(event) = progress_rx.recv().await {
        match event {
            Progress::StageStopped { direction, stage } => stopped.push((direction, stage.index)),
            Progress::StageStarted {
                direction, stage, ..
            } => started.push((direction, stage.index)),
            _ => {}
        }
    }

    assert_eq!(stopped, vec![(Direction::Download, 1)]);
    assert_eq!(
        started,
        vec![
            (Direction::Download, 0),
            (Direction::Upload, 0),
            (Direction::Upload, 1),
            (Direction::Upload, 2),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_probe_sizes_follow_the_ladder() -> Result<()> {
    let config = EngineConfig {
        sizes: vec![100_000, 1_000_000],
        ..EngineConfig::default()
    };
    let probe = ScriptedProbe::new(0.005, 1e9, 1e9);
    let engine = SpeedTest::new(probe, config);
    engine.run_standard_test().await?;

    // SpeedTest owns the probe; rebuild the expectation from the formula.
    let expected_downloads: Vec<u64> = std::iter::repeat(100_000)
        .take(12)
        .chain(std::iter::repeat(1_000_000).take(10))
        .collect();
    let expected_uploads: Vec<u64> = std::iter::repeat(100_000)
        .take(10)
        .chain(std::iter::repeat(1_000_000).take(8))
        .collect();

    let probe = engine.into_probe();
    assert_eq!(*probe.download_sizes.lock().unwrap(), expected_downloads);
    assert_eq!(*probe.upload_sizes.lock().unwrap(), expected_uploads);
    assert_eq!(probe.latency_calls.load(Ordering::SeqCst), 21);
    Ok(())
}

#[tokio::test]
async fn test_upload_failure_aborts_run() {
    let mut probe = ScriptedProbe::new(0.005, 1e8, 1e8);
    probe.fail_upload = true;
    let engine = SpeedTest::new(probe, single_stage_config());

    let err = engine
        .run_standard_test()
        .await
        .expect_err("a failing upload must abort the run");
    assert!(err.is_network());
    assert!(matches!(err, SpeedTestError::Status { .. }));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_probing() {
    let config = EngineConfig {
        percentile: 0.0,
        ..single_stage_config()
    };
    let engine = SpeedTest::new(ScriptedProbe::new(0.005, 1e8, 1e8), config);

    let err = engine.run_standard_test().await.unwrap_err();
    assert!(matches!(err, SpeedTestError::InvalidInput(_)));
    assert_eq!(engine.into_probe().latency_calls.load(Ordering::SeqCst), 0);
}
