use serde::{Deserialize, Serialize};

use crate::error::{EmissionError, Result};

/// Number of input features: engine size, cylinders, fuel consumption.
pub const N_FEATURES: usize = 3;

pub type FeatureRow = [f64; N_FEATURES];

// ---------------------------------------------------------------------------
// Tree structure
// ---------------------------------------------------------------------------

/// A node in a regression tree (either internal split or leaf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Predicts the mean target of the training samples that reached it.
    Leaf { value: f64, n_samples: usize },
    /// Samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        /// Reduction of the summed squared error achieved by this split.
        improvement: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn predict(&self, x: &FeatureRow) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn accumulate_importances(&self, importances: &mut [f64; N_FEATURES]) {
        if let TreeNode::Split {
            feature,
            improvement,
            left,
            right,
            ..
        } = self
        {
            importances[*feature] += improvement;
            left.accumulate_importances(importances);
            right.accumulate_importances(importances);
        }
    }
}

// ---------------------------------------------------------------------------
// DecisionTreeRegressor
// ---------------------------------------------------------------------------

/// CART regression tree with a squared-error split criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    /// Fit the tree on the rows selected by `indices` (duplicates allowed,
    /// which is how bootstrap samples are passed in).
    pub fn fit_indices(&mut self, x: &[FeatureRow], y: &[f64], indices: &[usize]) -> Result<()> {
        if x.len() != y.len() {
            return Err(EmissionError::Training(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        if indices.is_empty() {
            return Err(EmissionError::Training("cannot fit a tree on zero samples".into()));
        }
        let mut idx = indices.to_vec();
        self.root = Some(self.build(x, y, &mut idx));
        Ok(())
    }

    pub fn fit(&mut self, x: &[FeatureRow], y: &[f64]) -> Result<()> {
        let indices: Vec<usize> = (0..x.len()).collect();
        self.fit_indices(x, y, &indices)
    }

    /// Predict a single row. An unfitted tree predicts `NaN`.
    pub fn predict_one(&self, x: &FeatureRow) -> f64 {
        self.root.as_ref().map_or(f64::NAN, |root| root.predict(x))
    }

    pub(crate) fn accumulate_importances(&self, importances: &mut [f64; N_FEATURES]) {
        if let Some(root) = &self.root {
            root.accumulate_importances(importances);
        }
    }

    fn build(&self, x: &[FeatureRow], y: &[f64], indices: &mut [usize]) -> TreeNode {
        let n = indices.len();
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let mean = sum / n as f64;
        let sse = (sum_sq - sum * sum / n as f64).max(0.0);

        let leaf = TreeNode::Leaf {
            value: mean,
            n_samples: n,
        };

        if n < self.min_samples_split || sse < 1e-10 {
            return leaf;
        }

        let Some(split) = best_split(x, y, indices, self.min_samples_leaf) else {
            return leaf;
        };
        let improvement = sse - split.sse;
        if improvement <= 1e-12 {
            return leaf;
        }

        // Partition in place: left block first.
        let mut left_len = 0;
        for k in 0..n {
            if x[indices[k]][split.feature] <= split.threshold {
                indices.swap(left_len, k);
                left_len += 1;
            }
        }
        if left_len == 0 || left_len == n {
            return leaf;
        }

        let (left_idx, right_idx) = indices.split_at_mut(left_len);
        let left = self.build(x, y, left_idx);
        let right = self.build(x, y, right_idx);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            improvement,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

// ---------------------------------------------------------------------------
// Split search
// ---------------------------------------------------------------------------

struct Split {
    feature: usize,
    threshold: f64,
    /// Summed squared error of both children after the split.
    sse: f64,
}

/// Find the split minimising the children's summed squared error.
///
/// Each feature is sorted once and swept with running sums, so the search is
/// O(n log n) per feature. Thresholds sit halfway between adjacent distinct
/// values.
fn best_split(x: &[FeatureRow], y: &[f64], indices: &[usize], min_leaf: usize) -> Option<Split> {
    let n = indices.len();
    let (total_sum, total_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));

    let mut best: Option<Split> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..N_FEATURES {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for k in 1..n {
            let prev = sorted[k - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let lo = x[prev][feature];
            let hi = x[sorted[k]][feature];
            if lo == hi || k < min_leaf || n - k < min_leaf {
                continue;
            }

            let n_left = k as f64;
            let n_right = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left).max(0.0)
                + (right_sq - right_sum * right_sum / n_right).max(0.0);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                let mut threshold = (lo + hi) / 2.0;
                // Midpoint can round up to `hi` for adjacent floats.
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    sse,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn step_function_is_learned_exactly() {
        let x: Vec<FeatureRow> = (0..10).map(|i| [i as f64, 4.0, 8.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { 100.0 } else { 300.0 }).collect();

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        assert_relative_eq!(tree.predict_one(&[2.0, 4.0, 8.0]), 100.0);
        assert_relative_eq!(tree.predict_one(&[7.0, 4.0, 8.0]), 300.0);
        assert_relative_eq!(tree.predict_one(&[4.5, 0.0, 0.0]), 100.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn splits_on_the_informative_feature() {
        let x: Vec<FeatureRow> = (0..20)
            .map(|i| [((i * 7) % 5) as f64, (i % 2) as f64 * 4.0 + 4.0, 8.0])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| if r[1] > 4.0 { 250.0 } else { 150.0 }).collect();

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        let mut imp = [0.0; N_FEATURES];
        tree.accumulate_importances(&mut imp);
        assert!(imp[1] > 0.0);
        assert_eq!(imp[0], 0.0);
        assert_eq!(imp[2], 0.0);
    }

    #[test]
    fn constant_target_gives_single_leaf() {
        let x: Vec<FeatureRow> = (0..5).map(|i| [i as f64, 4.0, 8.0]).collect();
        let y = vec![190.0; 5];
        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_relative_eq!(tree.predict_one(&[99.0, 1.0, 1.0]), 190.0);
    }

    #[test]
    fn duplicate_indices_act_as_weights() {
        let x: Vec<FeatureRow> = vec![[1.0, 4.0, 8.0], [1.0, 4.0, 8.0]];
        let y = vec![100.0, 200.0];
        let mut tree = DecisionTreeRegressor::new();
        tree.fit_indices(&x, &y, &[0, 0, 0, 1]).unwrap();
        assert_relative_eq!(tree.predict_one(&[1.0, 4.0, 8.0]), 125.0);
    }

    #[test]
    fn unfitted_tree_predicts_nan_and_empty_fit_fails() {
        let mut tree = DecisionTreeRegressor::new();
        assert!(tree.predict_one(&[1.0, 2.0, 3.0]).is_nan());
        assert!(tree.fit(&[], &[]).is_err());
        assert!(!tree.is_fitted());
    }

    #[test]
    fn mismatched_lengths_fail() {
        let mut tree = DecisionTreeRegressor::new();
        let err = tree.fit(&[[1.0, 2.0, 3.0]], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, EmissionError::Training(_)));
    }
}
