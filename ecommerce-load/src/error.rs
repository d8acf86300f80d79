use rand::distributions::WeightedError;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a single failed request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Anything but `200 OK`. Other 2xx codes are failures too.
    #[error("Status code: {}", .0.as_u16())]
    Status(StatusCode),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid host URL: {0}")]
    InvalidHost(#[from] url::ParseError),

    #[error("Unsupported host scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),

    #[error("HTTP client could not be built: {0}")]
    Client(#[from] reqwest::Error),

    #[error("At least one user is required")]
    NoUsers,

    #[error("Spawn rate must be a positive number, got {0}")]
    InvalidSpawnRate(f64),

    #[error("Minimum wait time {min:?} is greater than maximum wait time {max:?}")]
    InvalidWaitTime { min: Duration, max: Duration },

    #[error("Report interval must be non-zero")]
    InvalidReportInterval,

    #[error("Invalid task weights: {0}")]
    Weights(#[from] WeightedError),
}
