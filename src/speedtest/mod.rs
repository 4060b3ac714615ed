pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod ping;
pub mod probe;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod timing;
pub mod upload;

pub use config::EngineConfig;
pub use engine::{Progress, SpeedTest};
pub use error::{Result, SpeedTestError};
pub use probe::{HttpProbe, Probe, Transfer};
pub use report::MeasurementReport;
pub use scheduler::{Direction, StageSchedule, StageSpec, StageStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    Connecting,
    Ping,
    Download,
    Upload,
    Complete,
    Failed,
}
