use super::config::EngineConfig;
use super::error::Result;
use super::stats::percentile;
use tracing::debug;

/// Bytes per megabit, used to turn a projected byte count into the time it
/// would take at the current Mb/s estimate.
const BYTES_PER_MEGABIT: f64 = 125_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Download => "download",
            Direction::Upload => "upload",
        }
    }
}

/// One rung of the payload-size ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub index: usize,
    pub payload_bytes: u64,
    /// `base_repeat - 2 * index`; zero or below means the stage issues no probes.
    pub repeat_count: i64,
}

impl StageSpec {
    pub fn new(index: usize, payload_bytes: u64, base_repeat: i64) -> Self {
        Self {
            index,
            payload_bytes,
            repeat_count: base_repeat - 2 * index as i64,
        }
    }

    pub fn probe_count(&self) -> usize {
        self.repeat_count.max(0) as usize
    }

    /// Saturates at `u64::MAX`, which no estimate can move within patience.
    pub fn total_projected_bytes(&self) -> u64 {
        self.payload_bytes.saturating_mul(self.probe_count() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    NotStarted,
    Running(usize),
    /// Early stop: the stage at this index was judged too slow to finish
    /// within the patience budget.
    Stopped(usize),
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStep {
    Run(StageSpec),
    Stop(StageSpec),
    Done,
}

/// Stage state machine for one transfer direction.
///
/// Each direction owns its schedule, so an early stop in one direction
/// never affects the other.
#[derive(Debug, Clone)]
pub struct StageSchedule {
    direction: Direction,
    sizes: Vec<u64>,
    base_repeat: i64,
    percentile: f64,
    patience: f64,
    state: ScheduleState,
    next_index: usize,
    samples: Vec<f64>,
    estimated_mbps: Option<f64>,
}

impl StageSchedule {
    pub fn new(direction: Direction, config: &EngineConfig) -> Self {
        Self {
            direction,
            sizes: config.sizes.clone(),
            base_repeat: config.base_repeat(direction),
            percentile: config.percentile,
            patience: config.patience,
            state: ScheduleState::NotStarted,
            next_index: 0,
            samples: Vec::new(),
            estimated_mbps: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            ScheduleState::Stopped(_) | ScheduleState::Exhausted
        )
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn estimated_mbps(&self) -> Option<f64> {
        self.estimated_mbps
    }

    /// Advance to the next stage of the ladder.
    ///
    /// Until a rate estimate exists the stage runs unconditionally. After
    /// that a stage is only run when its projected bytes can be moved within
    /// `patience` seconds at the current estimate; otherwise the schedule
    /// stops for good.
    pub fn next_stage(&mut self) -> StageStep {
        if self.is_finished() {
            return StageStep::Done;
        }

        let Some(&payload_bytes) = self.sizes.get(self.next_index) else {
            self.state = ScheduleState::Exhausted;
            return StageStep::Done;
        };

        let stage = StageSpec::new(self.next_index, payload_bytes, self.base_repeat);

        if let Some(mbps) = self.estimated_mbps {
            let projected_megabits = stage.total_projected_bytes() as f64 / BYTES_PER_MEGABIT;
            if mbps * self.patience < projected_megabits {
                debug!(
                    direction = self.direction.label(),
                    stage = stage.index,
                    estimated_mbps = mbps,
                    projected_megabits,
                    "Stage exceeds patience budget"
                );
                self.state = ScheduleState::Stopped(stage.index);
                return StageStep::Stop(stage);
            }
        }

        self.state = ScheduleState::Running(stage.index);
        self.next_index += 1;
        StageStep::Run(stage)
    }

    /// Append a finished stage's samples and refresh the rate estimate from
    /// every sample collected so far.
    pub fn record(&mut self, samples: &[f64]) -> Result<()> {
        self.samples.extend_from_slice(samples);
        if !self.samples.is_empty() {
            self.estimated_mbps = Some(percentile(&self.samples, self.percentile)? / 1_000_000.0);
        }
        Ok(())
    }
}
