use std::collections::BTreeSet;

use super::model::{Dataset, FuelType};

// ---------------------------------------------------------------------------
// Plot filter: which fuel types are shown in the analysis charts
// ---------------------------------------------------------------------------

/// Set of fuel types currently selected for display.
/// An empty set hides every record.
pub type FuelFilter = BTreeSet<FuelType>;

/// Initialise a [`FuelFilter`] with every fuel type present in the dataset selected.
pub fn init_fuel_filter(dataset: &Dataset) -> FuelFilter {
    dataset.fuel_counts.keys().copied().collect()
}

/// Return indices of records whose fuel type is selected.
pub fn visible_indices(dataset: &Dataset, selected: &FuelFilter) -> Vec<usize> {
    // Everything selected → no filtering needed
    if dataset.fuel_counts.keys().all(|ft| selected.contains(ft)) {
        return (0..dataset.len()).collect();
    }
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selected.contains(&rec.fuel_type))
        .map(|(i, _)| i)
        .collect()
}
