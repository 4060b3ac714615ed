use super::config::EngineConfig;
use super::error::Result;
use super::probe::Probe;
use super::report::MeasurementReport;
use super::scheduler::{Direction, StageSchedule, StageSpec, StageStep};
use super::TestPhase;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Events emitted while a run is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Phase(TestPhase),
    Latency { sample_ms: f64 },
    StageStarted {
        direction: Direction,
        stage: StageSpec,
        ladder_len: usize,
    },
    StageStopped {
        direction: Direction,
        stage: StageSpec,
    },
    Throughput { direction: Direction, bps: f64 },
}

/// The measurement engine: a latency sub-stage followed by an adaptive,
/// per-direction climb of the payload-size ladder.
pub struct SpeedTest<P> {
    probe: P,
    config: EngineConfig,
    progress: Option<mpsc::Sender<Progress>>,
}

impl<P: Probe> SpeedTest<P> {
    pub fn new(probe: P, config: EngineConfig) -> Self {
        Self {
            probe,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress_tx: mpsc::Sender<Progress>) -> Self {
        self.progress = Some(progress_tx);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_probe(self) -> P {
        self.probe
    }

    /// Run latency, download and upload measurements and reduce them into a
    /// report. Any probe failure aborts the whole run.
    pub async fn run_standard_test(&self) -> Result<MeasurementReport> {
        self.config.validate()?;
        info!(
            sizes = ?self.config.sizes,
            percentile = self.config.percentile,
            patience = self.config.patience,
            "Starting standard test"
        );

        let latency_samples = self.measure_latency().await?;

        let mut download = StageSchedule::new(Direction::Download, &self.config);
        let mut upload = StageSchedule::new(Direction::Upload, &self.config);

        while !(download.is_finished() && upload.is_finished()) {
            self.run_stage(&mut download).await?;
            self.run_stage(&mut upload).await?;
        }

        let report = MeasurementReport::from_samples(
            latency_samples,
            download.into_samples(),
            upload.into_samples(),
            self.config.percentile,
        )?;

        info!(
            download_bps = report.download_speed_bps,
            upload_bps = report.upload_speed_bps,
            latency_ms = report.latency_ms,
            jitter_ms = report.jitter_ms,
            "Standard test completed"
        );
        self.emit(Progress::Phase(TestPhase::Complete)).await;
        Ok(report)
    }

    async fn measure_latency(&self) -> Result<Vec<f64>> {
        self.emit(Progress::Phase(TestPhase::Ping)).await;

        // Warm-up so connection setup is not charged to the first sample.
        self.probe.latency().await?;

        let mut samples = Vec::with_capacity(self.config.latency_probes);
        for _ in 0..self.config.latency_probes {
            let sample_ms = self.probe.latency().await?.max(0.0) * 1000.0;
            samples.push(sample_ms);
            self.emit(Progress::Latency { sample_ms }).await;
        }

        debug!(count = samples.len(), "Latency sub-stage completed");
        Ok(samples)
    }

    async fn run_stage(&self, schedule: &mut StageSchedule) -> Result<()> {
        let direction = schedule.direction();

        let stage = match schedule.next_stage() {
            StageStep::Run(stage) => stage,
            StageStep::Stop(stage) => {
                info!(
                    direction = direction.label(),
                    stage = stage.index,
                    payload_bytes = stage.payload_bytes,
                    "Stopping early, next stage would exceed patience"
                );
                self.emit(Progress::StageStopped { direction, stage }).await;
                return Ok(());
            }
            StageStep::Done => return Ok(()),
        };

        self.emit(Progress::StageStarted {
            direction,
            stage,
            ladder_len: self.config.sizes.len(),
        })
        .await;

        let mut samples = Vec::with_capacity(stage.probe_count());
        for _ in 0..stage.probe_count() {
            let transfer = match direction {
                Direction::Download => self.probe.download(stage.payload_bytes).await?,
                Direction::Upload => self.probe.upload(stage.payload_bytes).await?,
            };
            let bps = transfer.bits_per_second();
            samples.push(bps);
            self.emit(Progress::Throughput { direction, bps }).await;
        }

        schedule.record(&samples)?;
        info!(
            direction = direction.label(),
            stage = stage.index,
            payload_bytes = stage.payload_bytes,
            probes = samples.len(),
            estimated_mbps = schedule.estimated_mbps(),
            "Stage completed"
        );
        Ok(())
    }

    async fn emit(&self, event: Progress) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event).await;
        }
    }
}
