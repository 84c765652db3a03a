use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::forest::RandomForestRegressor;
use super::tree::{FeatureRow, N_FEATURES};
use crate::config::PipelineConfig;
use crate::data::outliers::CleanedSubset;
use crate::error::{EmissionError, Result};

/// Feature labels in model input order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = ["Engine size", "Cylinders", "Fuel consumption"];

// ---------------------------------------------------------------------------
// TrainedModel
// ---------------------------------------------------------------------------

/// A fitted forest plus the facts needed to recognise what it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub forest: RandomForestRegressor,
    /// Fingerprint of the [`CleanedSubset`] the forest was fitted on.
    pub fingerprint: String,
    pub n_samples: usize,
    /// R² on the training rows.
    pub train_r2: f64,
    pub trained_at: String,
}

impl TrainedModel {
    /// Predicted CO2 (g/km) for `[engine size, cylinders, fuel consumption]`.
    pub fn predict(&self, features: &FeatureRow) -> f64 {
        self.forest.predict_one(features)
    }

    /// Whether this model was built from `fingerprint` with the forest settings in `config`.
    pub fn matches(&self, fingerprint: &str, config: &PipelineConfig) -> bool {
        self.fingerprint == fingerprint
            && self.forest.n_estimators() == config.n_estimators
            && self.forest.random_state() == config.seed
    }
}

/// Fit the forest on a cleaned subset.
///
/// # Errors
///
/// [`EmissionError::Training`] when the subset is empty or holds a
/// non-finite value.
pub fn train(subset: &CleanedSubset, config: &PipelineConfig) -> Result<TrainedModel> {
    if subset.is_empty() {
        return Err(EmissionError::Training(
            "cleaned subset is empty; nothing to train on".into(),
        ));
    }
    if let Some(pos) = subset.rows.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
        return Err(EmissionError::Training(format!(
            "row {pos} of the cleaned subset contains a non-finite value"
        )));
    }

    let fingerprint = subset.fingerprint();
    let x: Vec<FeatureRow> = subset.features();
    let y = subset.targets();

    log::info!(
        "Training forest: {} trees, seed {}, {} samples, subset {}",
        config.n_estimators,
        config.seed,
        x.len(),
        &fingerprint[..12]
    );
    let started = Instant::now();

    let mut forest = RandomForestRegressor::new(config.n_estimators).with_random_state(config.seed);
    forest.fit(&x, &y)?;
    let train_r2 = forest.score(&x, &y);

    log::info!(
        "Training finished in {:.2?} (train R² = {train_r2:.4})",
        started.elapsed()
    );

    Ok(TrainedModel {
        forest,
        fingerprint,
        n_samples: x.len(),
        train_r2,
        trained_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

// ---------------------------------------------------------------------------
// ModelCache – one trained model per distinct subset
// ---------------------------------------------------------------------------

/// Memoizes trained models by subset fingerprint and forest settings.
///
/// The lock is held while a model is built, so concurrent callers asking for
/// the same subset wait for the first build instead of training again. The
/// same single lock also serializes builds for *different* subsets, and
/// [`ModelCache::len`] blocks while a fit is running.
///
/// Entries are never evicted: every dataset opened during the session keeps
/// its forest in memory until the process exits.
#[derive(Debug, Default)]
pub struct ModelCache {
    models: Mutex<HashMap<String, Arc<TrainedModel>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache shared by every pipeline.
    pub fn global() -> Arc<ModelCache> {
        static GLOBAL: OnceLock<Arc<ModelCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(ModelCache::new())).clone()
    }

    fn key(fingerprint: &str, config: &PipelineConfig) -> String {
        format!("{fingerprint}:{}:{}", config.n_estimators, config.seed)
    }

    /// Return the cached model for `subset`, building it with `build` on a miss.
    pub fn get_or_try_insert<F>(
        &self,
        subset: &CleanedSubset,
        config: &PipelineConfig,
        build: F,
    ) -> Result<Arc<TrainedModel>>
    where
        F: FnOnce() -> Result<TrainedModel>,
    {
        let key = Self::key(&subset.fingerprint(), config);
        let mut models = self
            .models
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(model) = models.get(&key) {
            log::debug!("Model cache hit for {key}");
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(build()?);
        models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Train on `subset` unless an equivalent model is already cached.
    pub fn get_or_train(&self, subset: &CleanedSubset, config: &PipelineConfig) -> Result<Arc<TrainedModel>> {
        self.get_or_try_insert(subset, config, || train(subset, config))
    }

    pub fn len(&self) -> usize {
        self.models
            .lock()
            .map(|m| m.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::outliers::{ColumnStats, N_COLUMNS};

    fn subset(rows: Vec<[f64; N_COLUMNS]>) -> CleanedSubset {
        let stats = ColumnStats::compute(&rows);
        CleanedSubset {
            source_indices: (0..rows.len()).collect(),
            rows,
            stats,
            threshold: 1.9,
        }
    }

    fn sample_rows() -> Vec<[f64; N_COLUMNS]> {
        (0..40)
            .map(|i| {
                let engine = 1.2 + (i % 8) as f64 * 0.35;
                let cyl = if engine > 2.5 { 6.0 } else { 4.0 };
                let cons = 5.5 + engine * 1.8;
                [engine, cyl, cons, 23.0 * cons + 3.0]
            })
            .collect()
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            n_estimators: 8,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn empty_subset_is_a_training_error() {
        let err = train(&subset(Vec::new()), &small_config()).unwrap_err();
        assert!(matches!(err, EmissionError::Training(_)));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut rows = sample_rows();
        rows[3][2] = f64::NAN;
        let err = train(&subset(rows), &small_config()).unwrap_err();
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn trained_model_records_its_origin() {
        let s = subset(sample_rows());
        let config = small_config();
        let model = train(&s, &config).unwrap();
        assert_eq!(model.n_samples, 40);
        assert_eq!(model.fingerprint, s.fingerprint());
        assert!(model.matches(&s.fingerprint(), &config));
        assert!(!model.matches("other", &config));
        assert!(model.train_r2 > 0.9);
    }

    #[test]
    fn retraining_same_subset_is_deterministic() {
        let s = subset(sample_rows());
        let config = small_config();
        let a = train(&s, &config).unwrap();
        let b = train(&s, &config).unwrap();
        let row = [2.0, 4.0, 100.0 / 15.0];
        assert_eq!(a.predict(&row), b.predict(&row));
        assert_eq!(a.forest, b.forest);
    }

    #[test]
    fn cache_trains_once_per_subset() {
        let cache = ModelCache::new();
        let config = small_config();
        let s = subset(sample_rows());

        let first = cache.get_or_train(&s, &config).unwrap();
        let mut builds = 0;
        let second = cache
            .get_or_try_insert(&s, &config, || {
                builds += 1;
                train(&s, &config)
            })
            .unwrap();
        assert_eq!(builds, 0);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let mut other_rows = sample_rows();
        other_rows[0][3] += 1.0;
        let third = cache.get_or_train(&subset(other_rows), &config).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache = ModelCache::new();
        let config = small_config();
        assert!(cache.get_or_train(&subset(Vec::new()), &config).is_err());
        assert!(cache.is_empty());
    }
}
