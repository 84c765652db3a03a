use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source table layout
// ---------------------------------------------------------------------------

pub const COL_MAKE: &str = "Make";
pub const COL_MODEL: &str = "Model";
pub const COL_VEHICLE_CLASS: &str = "Vehicle Class";
pub const COL_ENGINE_SIZE: &str = "Engine Size(L)";
pub const COL_CYLINDERS: &str = "Cylinders";
pub const COL_FUEL_TYPE: &str = "Fuel Type";
pub const COL_FUEL_CONSUMPTION: &str = "Fuel Consumption Comb (L/100 km)";
pub const COL_CO2: &str = "CO2 Emissions(g/km)";

/// Default dataset file, looked up relative to the working directory.
pub const DEFAULT_DATASET_PATH: &str = "co2 Emissions.csv";

/// Default location of the persisted model artifact.
pub const DEFAULT_MODEL_PATH: &str = "co2_model.bin";

/// Optional picture shown on the home page.
pub const HOME_IMAGE_PATH: &str = "home_image.png";

// ---------------------------------------------------------------------------
// Pipeline tunables
// ---------------------------------------------------------------------------

/// Rows with |z| at or above this value in any column are dropped before training.
pub const DEFAULT_Z_THRESHOLD: f64 = 1.9;

/// Number of trees in the forest.
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Base seed for bootstrap sampling.
pub const DEFAULT_SEED: u64 = 42;

/// Predictions at or above this value (g/km) are classified as high emission.
pub const HIGH_EMISSION_THRESHOLD: f64 = 200.0;

// ---------------------------------------------------------------------------
// Prediction input bounds
// ---------------------------------------------------------------------------

pub const ENGINE_SIZE_RANGE: (f64, f64) = (0.5, 10.0);
pub const CYLINDERS_RANGE: (u32, u32) = (2, 16);
pub const MILEAGE_RANGE: (f64, f64) = (1.0, 50.0);

pub const DEFAULT_ENGINE_SIZE: f64 = 2.0;
pub const DEFAULT_CYLINDERS: u32 = 4;
pub const DEFAULT_MILEAGE: f64 = 15.0;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Tunables for the load → filter → train chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub z_threshold: f64,
    pub n_estimators: usize,
    pub seed: u64,
    /// Train and overwrite the artifact even when a matching one exists on disk.
    pub always_retrain: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            z_threshold: DEFAULT_Z_THRESHOLD,
            n_estimators: DEFAULT_N_ESTIMATORS,
            seed: DEFAULT_SEED,
            always_retrain: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults with `CO2_DATASET` / `CO2_MODEL_PATH` overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("CO2_DATASET") {
            config.dataset_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("CO2_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        config
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }
}
