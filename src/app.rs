use crate::history::{MeasurementRecord, MeasurementStore};
use crate::meta::{fetch_connection_info, ConnectionInfo};
use crate::settings::Settings;
use crate::speedtest::{
    Direction, HttpProbe, MeasurementReport, Progress, SpeedTest, StageSpec, TestPhase,
};
use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Download,
    Upload,
    Ping,
}

impl Panel {
    pub fn next(self) -> Self {
        match self {
            Panel::Download => Panel::Upload,
            Panel::Upload => Panel::Ping,
            Panel::Ping => Panel::Download,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Panel::Download => Panel::Ping,
            Panel::Upload => Panel::Download,
            Panel::Ping => Panel::Upload,
        }
    }
}

/// Where a direction is on the size ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProgress {
    pub stage: StageSpec,
    pub ladder_len: usize,
    pub probes_done: usize,
    /// Set when the schedule gave up on this stage.
    pub stopped: bool,
}

impl StageProgress {
    pub fn ratio(&self) -> f64 {
        if self.stopped || self.ladder_len == 0 {
            return 1.0;
        }
        let within = match self.stage.probe_count() {
            0 => 1.0,
            total => self.probes_done as f64 / total as f64,
        };
        ((self.stage.index as f64 + within) / self.ladder_len as f64).min(1.0)
    }
}

pub struct App {
    pub phase: TestPhase,
    pub report: Option<MeasurementReport>,
    pub connection: Option<ConnectionInfo>,
    pub should_quit: bool,

    // UI state
    pub selected_panel: Panel,
    pub expanded: bool,
    pub message: Option<String>,

    // Ladder position per direction
    pub download_stage: Option<StageProgress>,
    pub upload_stage: Option<StageProgress>,

    // Samples for charts: Mb/s for throughput, ms for latency
    pub download_samples: Vec<f64>,
    pub upload_samples: Vec<f64>,
    pub ping_samples: Vec<f64>,

    cancel_tx: Option<mpsc::Sender<()>>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            phase: TestPhase::Idle,
            report: None,
            connection: None,
            should_quit: false,
            selected_panel: Panel::Download,
            expanded: false,
            message: None,
            download_stage: None,
            upload_stage: None,
            download_samples: Vec::new(),
            upload_samples: Vec::new(),
            ping_samples: Vec::new(),
            cancel_tx: None,
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(
            self.phase,
            TestPhase::Idle | TestPhase::Complete | TestPhase::Failed
        )
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Enter => {
                if self.expanded {
                    self.expanded = false;
                    None
                } else if !self.is_running() {
                    Some(AppAction::StartTest)
                } else {
                    self.expanded = true;
                    None
                }
            }
            KeyCode::Esc => {
                if self.expanded {
                    self.expanded = false;
                    None
                } else if self.is_running() {
                    Some(AppAction::CancelTest)
                } else {
                    None
                }
            }
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('j') => {
                if !self.expanded {
                    self.selected_panel = self.selected_panel.next();
                }
                None
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('k') => {
                if !self.expanded {
                    self.selected_panel = self.selected_panel.prev();
                }
                None
            }
            KeyCode::Char(' ') => {
                self.expanded = !self.expanded;
                None
            }
            _ => None,
        }
    }

    pub fn reset_for_new_test(&mut self) {
        self.phase = TestPhase::Connecting;
        self.report = None;
        self.message = None;
        self.download_stage = None;
        self.upload_stage = None;
        self.download_samples.clear();
        self.upload_samples.clear();
        self.ping_samples.clear();
        self.expanded = false;
    }

    pub fn handle_update(&mut self, update: TestUpdate) {
        match update {
            TestUpdate::Connected(info) => self.connection = Some(info),
            TestUpdate::Progress(progress) => self.apply_progress(progress),
            TestUpdate::Finished(report) => {
                self.report = Some(report);
                self.phase = TestPhase::Complete;
            }
            TestUpdate::Saved(path) => {
                self.message = Some(format!("Saved to {}", path.display()));
            }
            TestUpdate::Failed(message) => {
                self.message = Some(message);
                self.phase = TestPhase::Failed;
                self.cancel_tx = None;
            }
        }
    }

    fn apply_progress(&mut self, progress: Progress) {
        match progress {
            Progress::Phase(TestPhase::Complete) => {}
            Progress::Phase(phase) => self.phase = phase,
            Progress::Latency { sample_ms } => self.ping_samples.push(sample_ms),
            Progress::StageStarted {
                direction,
                stage,
                ladder_len,
            } => {
                self.phase = phase_for(direction);
                *self.stage_mut(direction) = Some(StageProgress {
                    stage,
                    ladder_len,
                    probes_done: 0,
                    stopped: false,
                });
            }
            Progress::StageStopped { direction, stage } => {
                let ladder_len = self
                    .stage_mut(direction)
                    .map(|s| s.ladder_len)
                    .unwrap_or(stage.index + 1);
                *self.stage_mut(direction) = Some(StageProgress {
                    stage,
                    ladder_len,
                    probes_done: 0,
                    stopped: true,
                });
            }
            Progress::Throughput { direction, bps } => {
                if let Some(stage) = self.stage_mut(direction) {
                    stage.probes_done += 1;
                }
                let mbps = bps / 1_000_000.0;
                match direction {
                    Direction::Download => self.download_samples.push(mbps),
                    Direction::Upload => self.upload_samples.push(mbps),
                }
            }
        }
    }

    fn stage_mut(&mut self, direction: Direction) -> &mut Option<StageProgress> {
        match direction {
            Direction::Download => &mut self.download_stage,
            Direction::Upload => &mut self.upload_stage,
        }
    }

    pub fn set_cancel_tx(&mut self, tx: mpsc::Sender<()>) {
        self.cancel_tx = Some(tx);
    }

    pub fn cancel_test(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.try_send(());
        }
        self.phase = TestPhase::Idle;
        self.message = Some("Test cancelled".to_string());
    }
}

fn phase_for(direction: Direction) -> TestPhase {
    match direction {
        Direction::Download => TestPhase::Download,
        Direction::Upload => TestPhase::Upload,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    StartTest,
    CancelTest,
}

#[derive(Debug, Clone)]
pub enum TestUpdate {
    Connected(ConnectionInfo),
    Progress(Progress),
    Finished(MeasurementReport),
    Saved(PathBuf),
    Failed(String),
}

/// Look up connection metadata, run the engine, and store the result,
/// forwarding progress to the dashboard. A cancel signal aborts the engine
/// and nothing is saved.
pub async fn run_speed_test(
    update_tx: mpsc::Sender<TestUpdate>,
    mut cancel_rx: mpsc::Receiver<()>,
    settings: Settings,
) -> Result<()> {
    let probe = HttpProbe::new(&settings.server, settings.timeout)?;

    let info = fetch_connection_info(probe.client(), &settings.server).await?;
    info!(ip = %info.client_ip, asn = info.asn, "Resolved connection metadata");
    let _ = update_tx.send(TestUpdate::Connected(info.clone())).await;

    let (progress_tx, mut progress_rx) = mpsc::channel::<Progress>(64);
    let engine = SpeedTest::new(probe, settings.engine.clone()).with_progress(progress_tx);
    let handle = tokio::spawn(async move { engine.run_standard_test().await });

    loop {
        tokio::select! {
            Some(()) = cancel_rx.recv() => {
                handle.abort();
                info!("Speed test cancelled");
                return Ok(());
            }
            progress = progress_rx.recv() => match progress {
                Some(progress) => {
                    let _ = update_tx.send(TestUpdate::Progress(progress)).await;
                }
                None => break,
            },
        }
    }

    let report = handle.await??;
    let _ = update_tx.send(TestUpdate::Finished(report.clone())).await;

    let store = MeasurementStore::new(&settings.data_dir);
    let path = store.append(MeasurementRecord::new(Local::now(), &info, &report))?;
    let _ = update_tx.send(TestUpdate::Saved(path)).await;

    Ok(())
}

/// `run_speed_test`, with any failure reported to the dashboard instead of
/// being returned.
pub async fn run_and_report(
    update_tx: mpsc::Sender<TestUpdate>,
    cancel_rx: mpsc::Receiver<()>,
    settings: Settings,
) {
    if let Err(e) = run_speed_test(update_tx.clone(), cancel_rx, settings).await {
        error!(error = %format!("{:#}", e), "Speed test failed");
        let _ = update_tx.send(TestUpdate::Failed(format!("{:#}", e))).await;
    }
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
