use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTreeRegressor, FeatureRow, N_FEATURES};
use crate::error::{EmissionError, Result};

/// Random forest regressor.
///
/// Ensemble of decision tree regressors, each trained on a bootstrap sample
/// of the training rows. Predictions are averaged across all trees. Tree `i`
/// draws its bootstrap sample from a generator seeded with `random_state + i`,
/// so the same data and configuration always produce the same forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    random_state: u64,
}

impl RandomForestRegressor {
    /// Creates a new forest with `n_estimators` trees.
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            random_state: 0,
        }
    }

    /// Sets the base seed for bootstrap sampling.
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn random_state(&self) -> u64 {
        self.random_state
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fits the forest to training data.
    ///
    /// # Errors
    ///
    /// Returns [`EmissionError::Training`] when there are no samples, the
    /// lengths of `x` and `y` differ, or `n_estimators` is zero.
    pub fn fit(&mut self, x: &[FeatureRow], y: &[f64]) -> Result<()> {
        let n_samples = x.len();
        if n_samples != y.len() {
            return Err(EmissionError::Training(
                "number of samples in X and y must match".into(),
            ));
        }
        if n_samples == 0 {
            return Err(EmissionError::Training("cannot fit with zero samples".into()));
        }
        if self.n_estimators == 0 {
            return Err(EmissionError::Training("forest needs at least one tree".into()));
        }

        let mut trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let seed = self.random_state.wrapping_add(i as u64);
            let sample = bootstrap_sample(n_samples, seed);

            let mut tree = DecisionTreeRegressor::new();
            tree.fit_indices(x, y, &sample)?;
            trees.push(tree);
        }
        self.trees = trees;
        Ok(())
    }

    /// Mean of all tree predictions for one row. `NaN` when unfitted.
    pub fn predict_one(&self, x: &FeatureRow) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_one(x)).sum();
        total / self.trees.len() as f64
    }

    pub fn predict(&self, x: &[FeatureRow]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Coefficient of determination R² on the given data.
    pub fn score(&self, x: &[FeatureRow], y: &[f64]) -> f64 {
        r_squared(y, &self.predict(x))
    }

    /// Feature importances based on mean decrease in squared error,
    /// normalised to sum to 1.0. `None` before fitting.
    pub fn feature_importances(&self) -> Option<[f64; N_FEATURES]> {
        if self.trees.is_empty() {
            return None;
        }
        let mut importances = [0.0; N_FEATURES];
        for tree in &self.trees {
            tree.accumulate_importances(&mut importances);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        Some(importances)
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_N_ESTIMATORS).with_random_state(crate::config::DEFAULT_SEED)
    }
}

/// Indices of a bootstrap sample (random sample with replacement).
fn bootstrap_sample(n_samples: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// R² = 1 − SS_res / SS_tot. A constant target scores 1.0 on a perfect fit
/// and 0.0 otherwise.
pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn linear_data() -> (Vec<FeatureRow>, Vec<f64>) {
        let x: Vec<FeatureRow> = (0..60)
            .map(|i| {
                let engine = 1.0 + (i % 12) as f64 * 0.4;
                let cyl = if engine > 3.0 { 6.0 } else { 4.0 };
                let cons = 5.0 + engine * 2.0 + (i % 5) as f64 * 0.3;
                [engine, cyl, cons]
            })
            .collect();
        let y = x.iter().map(|r| 23.0 * r[2] + 2.0).collect();
        (x, y)
    }

    #[test]
    fn same_seed_same_predictions() {
        let (x, y) = linear_data();
        let mut a = RandomForestRegressor::new(10).with_random_state(42);
        let mut b = RandomForestRegressor::new(10).with_random_state(42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
        let row = [2.0, 4.0, 100.0 / 15.0];
        assert_eq!(a.predict_one(&row), b.predict_one(&row));
    }

    #[test]
    fn different_seed_changes_the_forest() {
        let (x, y) = linear_data();
        let mut a = RandomForestRegressor::new(5).with_random_state(1);
        let mut b = RandomForestRegressor::new(5).with_random_state(2);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fits_training_data_well() {
        let (x, y) = linear_data();
        let mut rf = RandomForestRegressor::new(20).with_random_state(42);
        rf.fit(&x, &y).unwrap();
        assert!(rf.score(&x, &y) > 0.9);
        assert_eq!(rf.n_estimators(), 20);
        assert_eq!(rf.random_state(), 42);
    }

    #[test]
    fn importances_sum_to_one() {
        let (x, y) = linear_data();
        let mut rf = RandomForestRegressor::new(10).with_random_state(7);
        assert!(rf.feature_importances().is_none());
        rf.fit(&x, &y).unwrap();
        let imp = rf.feature_importances().unwrap();
        assert_relative_eq!(imp.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(imp.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn unfitted_forest_predicts_nan() {
        let rf = RandomForestRegressor::new(3);
        assert!(rf.predict_one(&[1.0, 4.0, 8.0]).is_nan());
        assert!(!rf.is_fitted());
    }

    #[test]
    fn invalid_inputs_fail() {
        let mut rf = RandomForestRegressor::new(3);
        assert!(rf.fit(&[], &[]).is_err());
        assert!(rf.fit(&[[1.0, 4.0, 8.0]], &[1.0, 2.0]).is_err());
        let mut empty = RandomForestRegressor::new(0);
        assert!(empty.fit(&[[1.0, 4.0, 8.0]], &[1.0]).is_err());
    }

    #[test]
    fn bootstrap_is_deterministic_and_in_range() {
        let a = bootstrap_sample(50, 42);
        assert_eq!(a, bootstrap_sample(50, 42));
        assert_eq!(a.len(), 50);
        assert!(a.iter().all(|&i| i < 50));
    }

    #[test]
    fn r_squared_edge_cases() {
        assert_relative_eq!(r_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_relative_eq!(r_squared(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
        assert_relative_eq!(r_squared(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r_squared(&[], &[]), 0.0);
    }
}
