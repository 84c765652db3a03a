use sha2::{Digest, Sha256};

use super::model::Dataset;

/// Number of numeric columns projected for training.
pub const N_COLUMNS: usize = 4;

/// Column labels in projection order.
pub const COLUMN_NAMES: [&str; N_COLUMNS] = [
    "engine size",
    "cylinders",
    "fuel consumption",
    "CO2 emissions",
];

// ---------------------------------------------------------------------------
// Column statistics
// ---------------------------------------------------------------------------

/// Per-column mean and population standard deviation (ddof = 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: [f64; N_COLUMNS],
    pub std_dev: [f64; N_COLUMNS],
}

impl ColumnStats {
    pub fn compute(rows: &[[f64; N_COLUMNS]]) -> Self {
        let mut mean = [0.0; N_COLUMNS];
        let mut std_dev = [0.0; N_COLUMNS];
        if rows.is_empty() {
            return Self { mean, std_dev };
        }

        let n = rows.len() as f64;
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        for row in rows {
            for c in 0..N_COLUMNS {
                let d = row[c] - mean[c];
                std_dev[c] += d * d;
            }
        }
        for s in &mut std_dev {
            *s = (*s / n).sqrt();
        }

        Self { mean, std_dev }
    }

    /// Standardized scores of one row. A zero-variance column scores 0.0.
    pub fn z_scores(&self, row: &[f64; N_COLUMNS]) -> [f64; N_COLUMNS] {
        let mut z = [0.0; N_COLUMNS];
        for c in 0..N_COLUMNS {
            if self.std_dev[c] > 0.0 {
                z[c] = (row[c] - self.mean[c]) / self.std_dev[c];
            }
        }
        z
    }

    /// Whether every column's |z| is strictly below `threshold`.
    pub fn within(&self, row: &[f64; N_COLUMNS], threshold: f64) -> bool {
        self.z_scores(row).iter().all(|z| z.abs() < threshold)
    }
}

// ---------------------------------------------------------------------------
// CleanedSubset – training rows that survived the z-score filter
// ---------------------------------------------------------------------------

/// Numeric projection of the dataset with outliers removed.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSubset {
    /// Index of each retained row in the source [`Dataset`].
    pub source_indices: Vec<usize>,
    /// Retained rows: engine size, cylinders, fuel consumption, CO2.
    pub rows: Vec<[f64; N_COLUMNS]>,
    /// Statistics of the full projection the filter was computed against.
    pub stats: ColumnStats,
    pub threshold: f64,
}

impl CleanedSubset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature vectors `[engine size, cylinders, fuel consumption]`.
    pub fn features(&self) -> Vec<[f64; 3]> {
        self.rows.iter().map(|r| [r[0], r[1], r[2]]).collect()
    }

    /// Target values (CO2 g/km).
    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r[3]).collect()
    }

    /// SHA-256 hex digest over the retained values, used to recognise a
    /// subset that has already been trained on.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.rows.len() as u64).to_le_bytes());
        for row in &self.rows {
            for v in row {
                hasher.update(v.to_bits().to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Drop every row whose |z| reaches `threshold` in any of the four columns.
pub fn remove_outliers(dataset: &Dataset, threshold: f64) -> CleanedSubset {
    let projected: Vec<[f64; N_COLUMNS]> = dataset.records.iter().map(|r| r.numeric_row()).collect();
    let stats = ColumnStats::compute(&projected);

    for (c, name) in COLUMN_NAMES.iter().enumerate() {
        if !projected.is_empty() && stats.std_dev[c] == 0.0 {
            log::warn!("Column '{name}' has zero variance; it is ignored by the outlier filter");
        }
    }

    let (source_indices, rows): (Vec<usize>, Vec<[f64; N_COLUMNS]>) = projected
        .into_iter()
        .enumerate()
        .filter(|(_, row)| stats.within(row, threshold))
        .unzip();

    log::info!(
        "Outlier filter (|z| < {threshold}) kept {} of {} rows",
        rows.len(),
        dataset.len()
    );

    CleanedSubset {
        source_indices,
        rows,
        stats,
        threshold,
    }
}
