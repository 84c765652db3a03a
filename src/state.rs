use std::path::Path;
use std::sync::Arc;

use co2_predictor::data::filter::{FuelFilter, init_fuel_filter, visible_indices};
use co2_predictor::data::model::{Dataset, FuelType};
use co2_predictor::model::TrainedModel;
use co2_predictor::{Pipeline, PipelineConfig, PredictionInput, Report, VehicleIdentity};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    DataAnalysis,
    Prediction,
    About,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::DataAnalysis, Page::Prediction, Page::About];

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::DataAnalysis => "Data Analysis (Graphs)",
            Page::Prediction => "Prediction System",
            Page::About => "About Project",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Values entered on the prediction page.
#[derive(Debug, Clone, Default)]
pub struct PredictionForm {
    pub identity: VehicleIdentity,
    pub input: PredictionInput,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub page: Page,

    /// Load → filter → train chain for the current dataset file.
    pub pipeline: Arc<Pipeline>,

    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<Arc<Dataset>>,

    /// Trained model (None until training succeeds).
    pub model: Option<Arc<TrainedModel>>,

    /// Rows kept by the outlier filter.
    pub cleaned_rows: usize,

    /// Fuel types shown in the analysis plots.
    pub fuel_filter: FuelFilter,

    /// Indices of records passing the current fuel filter (cached).
    pub visible_indices: Vec<usize>,

    pub color_map: ColorMap,

    /// Show the first rows of the raw table on the analysis page.
    pub show_raw: bool,

    pub form: PredictionForm,

    /// Report for the most recent successful prediction.
    pub last_report: Option<Report>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Build the state and run the pipeline for the configured dataset.
    pub fn new(config: PipelineConfig) -> Self {
        let mut state = Self {
            page: Page::Home,
            pipeline: Arc::new(Pipeline::new(config)),
            dataset: None,
            model: None,
            cleaned_rows: 0,
            fuel_filter: FuelFilter::new(),
            visible_indices: Vec::new(),
            color_map: ColorMap::default(),
            show_raw: false,
            form: PredictionForm::default(),
            last_report: None,
            status_message: None,
        };
        state.initialise();
        state
    }

    /// Switch to another dataset file; everything derived from the old one is dropped.
    pub fn open_dataset(&mut self, path: &Path) {
        let config = self.pipeline.config().clone().with_dataset_path(path);
        self.pipeline = Arc::new(Pipeline::new(config));
        self.dataset = None;
        self.model = None;
        self.cleaned_rows = 0;
        self.last_report = None;
        self.status_message = None;
        self.initialise();
    }

    fn initialise(&mut self) {
        match self.pipeline.dataset() {
            Ok(ds) => self.set_dataset(ds),
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        }

        let trained = self
            .pipeline
            .cleaned()
            .and_then(|subset| {
                self.cleaned_rows = subset.len();
                self.pipeline.model()
            });
        match trained {
            Ok(model) => self.model = Some(model),
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset the plot filter.
    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.fuel_filter = init_fuel_filter(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.dataset = Some(dataset);
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = visible_indices(ds, &self.fuel_filter);
        }
    }

    /// Toggle a single fuel type in the plot filter.
    pub fn toggle_fuel(&mut self, fuel_type: FuelType) {
        if !self.fuel_filter.remove(&fuel_type) {
            self.fuel_filter.insert(fuel_type);
        }
        self.refilter();
    }

    pub fn select_all(&mut self) {
        if let Some(ds) = &self.dataset {
            self.fuel_filter = init_fuel_filter(ds);
            self.refilter();
        }
    }

    pub fn select_none(&mut self) {
        self.fuel_filter.clear();
        self.refilter();
    }

    /// Run the model on the form values and keep the report.
    pub fn run_prediction(&mut self) {
        match self.pipeline.predict(&self.form.input) {
            Ok(result) => {
                self.last_report = Some(Report::new(
                    self.form.identity.clone(),
                    self.form.input,
                    result,
                ));
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Prediction failed: {e}");
                self.last_report = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(path: &Path) {
        let mut text = String::from(
            "Engine Size(L),Cylinders,Fuel Type,Fuel Consumption Comb (L/100 km),CO2 Emissions(g/km)\n",
        );
        for i in 0..24 {
            let engine = 1.5 + (i % 6) as f64 * 0.5;
            let cons = 5.5 + engine * 1.6;
            let code = if i % 2 == 0 { "X" } else { "D" };
            text.push_str(&format!("{engine},4,{code},{cons:.1},{}\n", (cons * 23.5).round()));
        }
        std::fs::write(path, text).unwrap();
    }

    fn state_for(dir: &Path) -> AppState {
        let mut config = PipelineConfig::default()
            .with_dataset_path(dir.join("vehicles.csv"))
            .with_model_path(dir.join("model.bin"));
        config.n_estimators = 5;
        AppState::new(config)
    }

    #[test]
    fn missing_dataset_sets_status_message() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        assert!(state.dataset.is_none());
        assert!(state.model.is_none());
        assert!(state.status_message.as_deref().unwrap_or("").starts_with("Error:"));
    }

    #[test]
    fn fuel_toggles_update_visible_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(&dir.path().join("vehicles.csv"));
        let mut state = state_for(dir.path());
        assert!(state.model.is_some());
        assert_eq!(state.visible_indices.len(), 24);

        state.toggle_fuel(FuelType::Diesel);
        assert_eq!(state.visible_indices.len(), 12);

        state.select_none();
        assert!(state.visible_indices.is_empty());

        state.select_all();
        assert_eq!(state.visible_indices.len(), 24);
    }

    #[test]
    fn prediction_keeps_a_report() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(&dir.path().join("vehicles.csv"));
        let mut state = state_for(dir.path());
        state.form.identity = VehicleIdentity::new("Tata", "Nexon");
        state.run_prediction();

        let report = state.last_report.as_ref().unwrap();
        assert_eq!(report.suggested_file_name(), "CO2_Report_Tata_Nexon.txt");
        assert!(state.status_message.is_none());
    }
}
