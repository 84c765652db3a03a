use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::trainer::{ModelCache, TrainedModel, train};
use crate::config::PipelineConfig;
use crate::data::outliers::CleanedSubset;
use crate::error::{EmissionError, Result};

/// Summary written next to the binary artifact so a matching model can be
/// recognised without deserializing the forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub trained_at: String,
    pub fingerprint: String,
    pub n_estimators: usize,
    pub seed: u64,
    pub n_samples: usize,
    pub train_r2: f64,
}

impl ModelMetadata {
    fn from_model(model: &TrainedModel) -> Self {
        Self {
            trained_at: model.trained_at.clone(),
            fingerprint: model.fingerprint.clone(),
            n_estimators: model.forest.n_estimators(),
            seed: model.forest.random_state(),
            n_samples: model.n_samples,
            train_r2: model.train_r2,
        }
    }

    fn matches(&self, fingerprint: &str, config: &PipelineConfig) -> bool {
        self.fingerprint == fingerprint
            && self.n_estimators == config.n_estimators
            && self.seed == config.seed
    }
}

// ---------------------------------------------------------------------------
// ModelStore – bincode artifact + JSON sidecar on disk
// ---------------------------------------------------------------------------

/// Reads and writes the persisted model at a fixed path.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<artifact>.json`, e.g. `co2_model.bin.json`.
    pub fn metadata_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }

    fn persistence_error(&self, reason: impl std::fmt::Display) -> EmissionError {
        EmissionError::Persistence {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Write the artifact and its metadata, replacing any previous files.
    ///
    /// Each file is written to a sibling temp file and renamed into place, so
    /// readers and concurrent writers never observe a partial artifact.
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        let bytes = bincode::serialize(model)
            .map_err(|e| self.persistence_error(format!("serialization failed: {e}")))?;
        write_atomic(&self.path, &bytes).map_err(|e| self.persistence_error(e))?;

        let metadata = serde_json::to_vec_pretty(&ModelMetadata::from_model(model))
            .map_err(|e| self.persistence_error(format!("metadata serialization failed: {e}")))?;
        write_atomic(&self.metadata_path(), &metadata).map_err(|e| self.persistence_error(e))?;

        log::info!(
            "Model saved to {} ({} bytes, {} trees)",
            self.path.display(),
            bytes.len(),
            model.forest.n_estimators()
        );
        Ok(())
    }

    /// Read the artifact back.
    pub fn load(&self) -> Result<TrainedModel> {
        let bytes = fs::read(&self.path).map_err(|e| self.persistence_error(e))?;
        bincode::deserialize(&bytes)
            .map_err(|e| self.persistence_error(format!("deserialization failed: {e}")))
    }

    pub fn load_metadata(&self) -> Result<ModelMetadata> {
        let text = fs::read_to_string(self.metadata_path()).map_err(|e| self.persistence_error(e))?;
        serde_json::from_str(&text)
            .map_err(|e| self.persistence_error(format!("invalid metadata: {e}")))
    }

    /// Load the stored model if it was trained on `fingerprint` with the
    /// forest settings in `config`. Missing or stale artifacts yield `None`.
    pub fn load_matching(&self, fingerprint: &str, config: &PipelineConfig) -> Option<TrainedModel> {
        let metadata = match self.load_metadata() {
            Ok(meta) => meta,
            Err(e) => {
                log::debug!("No usable model metadata: {e}");
                return None;
            }
        };
        if !metadata.matches(fingerprint, config) {
            log::info!(
                "Stored model at {} was trained on different data; retraining",
                self.path.display()
            );
            return None;
        }
        match self.load() {
            Ok(model) if model.matches(fingerprint, config) => Some(model),
            Ok(_) => {
                log::warn!("Model artifact disagrees with its metadata; retraining");
                None
            }
            Err(e) => {
                log::warn!("Failed to read model artifact: {e}");
                None
            }
        }
    }

    /// Reuse a matching artifact, otherwise train and persist.
    ///
    /// With `config.always_retrain` the model is trained and the artifact
    /// overwritten unconditionally.
    pub fn load_or_train(&self, subset: &CleanedSubset, config: &PipelineConfig) -> Result<TrainedModel> {
        if !config.always_retrain {
            if let Some(model) = self.load_matching(&subset.fingerprint(), config) {
                log::info!(
                    "Reusing model from {} (trained {})",
                    self.path.display(),
                    model.trained_at
                );
                return Ok(model);
            }
        }
        let model = train(subset, config)?;
        self.save(&model)?;
        Ok(model)
    }

    /// [`Self::load_or_train`] behind the process-wide memo in `cache`.
    pub fn load_or_train_cached(
        &self,
        cache: &ModelCache,
        subset: &CleanedSubset,
        config: &PipelineConfig,
    ) -> Result<Arc<TrainedModel>> {
        cache.get_or_try_insert(subset, config, || self.load_or_train(subset, config))
    }
}

/// Write `bytes` to a uniquely named temp file beside `path`, then rename it
/// over `path`. Concurrent writers each land a whole file; the last rename wins.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
