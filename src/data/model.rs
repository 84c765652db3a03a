use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FuelType – categorical fuel label
// ---------------------------------------------------------------------------

/// Fuel category, decoded from the single-letter code used in the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FuelType {
    PetrolPremium,
    PetrolRegular,
    Diesel,
    Ethanol,
    NaturalGas,
}

impl FuelType {
    pub const ALL: [FuelType; 5] = [
        FuelType::PetrolPremium,
        FuelType::PetrolRegular,
        FuelType::Diesel,
        FuelType::Ethanol,
        FuelType::NaturalGas,
    ];

    /// Decode a raw fuel code (`Z`, `X`, `D`, `E`, `N`). Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "Z" => Some(FuelType::PetrolPremium),
            "X" => Some(FuelType::PetrolRegular),
            "D" => Some(FuelType::Diesel),
            "E" => Some(FuelType::Ethanol),
            "N" => Some(FuelType::NaturalGas),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            FuelType::PetrolPremium => "Z",
            FuelType::PetrolRegular => "X",
            FuelType::Diesel => "D",
            FuelType::Ethanol => "E",
            FuelType::NaturalGas => "N",
        }
    }

    /// Human-readable label shown in plots and reports.
    pub fn label(self) -> &'static str {
        match self {
            FuelType::PetrolPremium => "Petrol (Premium)",
            FuelType::PetrolRegular => "Petrol (Regular)",
            FuelType::Diesel => "Diesel",
            FuelType::Ethanol => "Ethanol (E85)",
            FuelType::NaturalGas => "Natural Gas",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the vehicle table
// ---------------------------------------------------------------------------

/// A single vehicle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub make: Option<String>,
    pub model: Option<String>,
    pub vehicle_class: Option<String>,
    /// Engine displacement in litres.
    pub engine_size_l: f64,
    pub cylinders: u32,
    /// Combined fuel consumption in L/100km.
    pub fuel_consumption_comb: f64,
    pub fuel_type: FuelType,
    /// Tailpipe CO2 in g/km.
    pub co2_g_per_km: f64,
}

impl Record {
    /// The four numeric columns used by the outlier filter, in fixed order:
    /// engine size, cylinders, fuel consumption, CO2.
    pub fn numeric_row(&self) -> [f64; 4] {
        [
            self.engine_size_l,
            self.cylinders as f64,
            self.fuel_consumption_comb,
            self.co2_g_per_km,
        ]
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed per-fuel-type counts.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records in source order.
    pub records: Vec<Record>,
    /// Row count per fuel type (only types present in `records`).
    pub fuel_counts: BTreeMap<FuelType, usize>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut fuel_counts: BTreeMap<FuelType, usize> = BTreeMap::new();
        for rec in &records {
            *fuel_counts.entry(rec.fuel_type).or_default() += 1;
        }
        Dataset {
            records,
            fuel_counts,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `n` records, for the raw-data preview.
    pub fn head(&self, n: usize) -> &[Record] {
        &self.records[..n.min(self.records.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fuel_type: FuelType, engine: f64, co2: f64) -> Record {
        Record {
            make: None,
            model: None,
            vehicle_class: None,
            engine_size_l: engine,
            cylinders: 4,
            fuel_consumption_comb: 8.5,
            fuel_type,
            co2_g_per_km: co2,
        }
    }

    #[test]
    fn fuel_codes_map_to_labels() {
        assert_eq!(FuelType::from_code("Z").map(FuelType::label), Some("Petrol (Premium)"));
        assert_eq!(FuelType::from_code("X").map(FuelType::label), Some("Petrol (Regular)"));
        assert_eq!(FuelType::from_code("D").map(FuelType::label), Some("Diesel"));
        assert_eq!(FuelType::from_code("E").map(FuelType::label), Some("Ethanol (E85)"));
        assert_eq!(FuelType::from_code("N").map(FuelType::label), Some("Natural Gas"));
        assert_eq!(FuelType::from_code(" X "), Some(FuelType::PetrolRegular));
        assert_eq!(FuelType::from_code("Q"), None);
        assert_eq!(FuelType::from_code(""), None);
    }

    #[test]
    fn code_round_trips_for_every_variant() {
        for ft in FuelType::ALL {
            assert_eq!(FuelType::from_code(ft.code()), Some(ft));
        }
    }

    #[test]
    fn dataset_counts_fuel_types() {
        let ds = Dataset::from_records(vec![
            record(FuelType::Diesel, 2.0, 180.0),
            record(FuelType::Diesel, 3.0, 220.0),
            record(FuelType::PetrolRegular, 1.6, 150.0),
        ]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.fuel_counts[&FuelType::Diesel], 2);
        assert_eq!(ds.fuel_counts[&FuelType::PetrolRegular], 1);
        let present: Vec<FuelType> = ds.fuel_counts.keys().copied().collect();
        assert_eq!(present, vec![FuelType::PetrolRegular, FuelType::Diesel]);
        assert_eq!(ds.head(10).len(), 3);
        assert_eq!(ds.head(1)[0].co2_g_per_km, 180.0);
    }

    #[test]
    fn numeric_row_order_is_fixed() {
        let rec = record(FuelType::Ethanol, 2.5, 210.0);
        assert_eq!(rec.numeric_row(), [2.5, 4.0, 8.5, 210.0]);
    }
}
