use std::sync::{Arc, Mutex, OnceLock};

use crate::config::PipelineConfig;
use crate::data::loader;
use crate::data::model::Dataset;
use crate::data::outliers::{CleanedSubset, remove_outliers};
use crate::error::Result;
use crate::model::{ModelCache, ModelStore, TrainedModel};
use crate::predict::{self, PredictionInput, PredictionResult};

/// Process-wide state for one dataset: Dataset → CleanedSubset → TrainedModel.
///
/// Each stage is built lazily on first use and then shared read-only.
/// Asking for a later stage builds the earlier ones first. A single init
/// lock serialises first-time construction so concurrent sessions never
/// build a stage twice.
pub struct Pipeline {
    config: PipelineConfig,
    store: ModelStore,
    cache: Arc<ModelCache>,
    init_lock: Mutex<()>,
    dataset: OnceLock<Arc<Dataset>>,
    cleaned: OnceLock<Arc<CleanedSubset>>,
    model: OnceLock<Arc<TrainedModel>>,
}

impl Pipeline {
    /// Pipeline backed by the process-wide model cache.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_cache(config, ModelCache::global())
    }

    pub fn with_cache(config: PipelineConfig, cache: Arc<ModelCache>) -> Self {
        let store = ModelStore::new(&config.model_path);
        Self {
            config,
            store,
            cache,
            init_lock: Mutex::new(()),
            dataset: OnceLock::new(),
            cleaned: OnceLock::new(),
            model: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run `build` once under the init lock, unless another caller got there first.
    fn init<T>(&self, cell: &OnceLock<Arc<T>>, build: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        if let Some(value) = cell.get() {
            return Ok(Arc::clone(value));
        }
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(value) = cell.get() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(build()?);
        // Cannot already be set: writers hold the init lock.
        let _ = cell.set(Arc::clone(&value));
        Ok(value)
    }

    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        if let Some(ds) = self.dataset.get() {
            return Ok(Arc::clone(ds));
        }
        self.init(&self.dataset, || loader::load_file(&self.config.dataset_path))
    }

    pub fn cleaned(&self) -> Result<Arc<CleanedSubset>> {
        if let Some(subset) = self.cleaned.get() {
            return Ok(Arc::clone(subset));
        }
        let dataset = self.dataset()?;
        self.init(&self.cleaned, || Ok(remove_outliers(&dataset, self.config.z_threshold)))
    }

    pub fn model(&self) -> Result<Arc<TrainedModel>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let cleaned = self.cleaned()?;
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let model = self
            .store
            .load_or_train_cached(&self.cache, &cleaned, &self.config)?;
        let _ = self.model.set(Arc::clone(&model));
        Ok(model)
    }

    /// Whether the model has been built already (no side effects).
    pub fn is_trained(&self) -> bool {
        self.model.get().is_some()
    }

    /// Validate `input` and predict with the (lazily trained) model.
    pub fn predict(&self, input: &PredictionInput) -> Result<PredictionResult> {
        input.validate()?;
        let model = self.model()?;
        predict::predict(&model, input)
    }
}
