pub mod record;
pub mod storage;

pub use record::MeasurementRecord;
pub use storage::{MeasurementStore, DEFAULT_DATA_DIR};
