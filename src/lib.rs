//! Vehicle CO2 emission explorer.
//!
//! Loads a vehicle emissions table, removes statistical outliers, fits a
//! seeded random forest on engine size, cylinder count and combined fuel
//! consumption, and predicts CO2 (g/km) for new vehicle specifications.
//!
//! ```text
//!  dataset ─► data::loader ─► Dataset ─► data::outliers ─► CleanedSubset
//!                                                             │
//!       PredictionInput ─► predict ◄── TrainedModel ◄── model::trainer ─► ModelStore
//!                            │
//!                            ▼
//!                    PredictionResult ─► report
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod report;

pub use config::PipelineConfig;
pub use error::{EmissionError, Result, ValidationError};
pub use pipeline::Pipeline;
pub use predict::{EmissionStatus, PredictionInput, PredictionResult};
pub use report::{Report, VehicleIdentity};
