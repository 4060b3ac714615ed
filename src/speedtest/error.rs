use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeedTestError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Response is missing the Server-Timing header")]
    MissingTimingHeader,

    #[error("Malformed Server-Timing header: {0}")]
    MalformedTimingHeader(String),
}

impl SpeedTestError {
    /// Whether the error came from talking to the measurement endpoint
    /// rather than from a local misuse of the estimators.
    pub fn is_network(&self) -> bool {
        !matches!(self, SpeedTestError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, SpeedTestError>;
