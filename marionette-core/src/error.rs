use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarionetteError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("driver stalled: {elapsed_ms} ms elapsed against a budget of {budget_ms} ms")]
    DriverStalled { elapsed_ms: u64, budget_ms: u64 },

    #[error("driver error: {0}")]
    Driver(#[source] anyhow::Error),

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MarionetteError>;
