use std::path::PathBuf;

use thiserror::Error;

/// Input value outside its accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field} value {value} is out of range [{min}, {max}]")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Errors raised anywhere in the load → filter → train → predict chain.
#[derive(Debug, Error)]
pub enum EmissionError {
    /// Source table missing, unreadable or lacking expected columns.
    #[error("failed to load dataset {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// Mileage of zero (or not a finite number) cannot be converted to L/100km.
    #[error("cannot convert mileage {mileage} km/L to fuel consumption")]
    Division { mileage: f64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("training failed: {0}")]
    Training(String),

    /// Model artifact could not be written or read back.
    #[error("model artifact {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EmissionError>;
