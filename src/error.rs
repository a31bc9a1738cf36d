//! Error types for estimation, simulation and risk aggregation

use thiserror::Error;

/// Errors that can occur anywhere in the estimate → simulate → analyze pipeline
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("No jumps detected beyond {threshold_std} standard deviations")]
    NoJumpsDetected { threshold_std: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Simulation cancelled")]
    Cancelled,

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RiskError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RiskError::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
