use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::predict::{PredictionInput, PredictionResult};

/// Optional brand / model text entered alongside the vehicle details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub brand: String,
    pub model: String,
}

impl VehicleIdentity {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
        }
    }

    /// "Brand Model", or "Vehicle" when both are blank.
    pub fn display_name(&self) -> String {
        let brand = self.brand.trim();
        let model = self.model.trim();
        if brand.is_empty() && model.is_empty() {
            "Vehicle".to_string()
        } else {
            format!("{brand} {model}").trim().to_string()
        }
    }
}

fn or_na(s: &str) -> &str {
    let s = s.trim();
    if s.is_empty() { "N/A" } else { s }
}

const RULE: &str = "==================================================";

/// Human-readable summary of one prediction.
#[derive(Debug, Clone)]
pub struct Report {
    pub identity: VehicleIdentity,
    pub input: PredictionInput,
    pub result: PredictionResult,
    pub generated_at: DateTime<Local>,
}

impl Report {
    pub fn new(identity: VehicleIdentity, input: PredictionInput, result: PredictionResult) -> Self {
        Self::at(identity, input, result, Local::now())
    }

    pub fn at(
        identity: VehicleIdentity,
        input: PredictionInput,
        result: PredictionResult,
        generated_at: DateTime<Local>,
    ) -> Self {
        Self {
            identity,
            input,
            result,
            generated_at,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "        VEHICLE CO2 EMISSION REPORT");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Date: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out);
        let _ = writeln!(out, "--- CAR IDENTITY ---");
        let _ = writeln!(out, "Brand: {}", or_na(&self.identity.brand));
        let _ = writeln!(out, "Model: {}", or_na(&self.identity.model));
        let _ = writeln!(out);
        let _ = writeln!(out, "--- TECHNICAL SPECIFICATIONS ---");
        let _ = writeln!(out, "Engine Size: {:?} L", self.input.engine_size_l);
        let _ = writeln!(out, "Cylinders: {}", self.input.cylinders);
        let _ = writeln!(out, "Mileage: {:?} km/L", self.input.mileage_kmpl);
        let _ = writeln!(
            out,
            "Calculated Fuel Cons.: {:.2} L/100km",
            self.result.fuel_consumption_l100
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "--- PREDICTION RESULT ---");
        let _ = writeln!(out, "Estimated CO2 Emission: {:.2} g/km", self.result.predicted_co2);
        let _ = writeln!(out, "Emission Status: {}", self.result.status);
        let _ = writeln!(out);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Generated by CO2 Prediction System");
        let _ = writeln!(out, "{RULE}");
        out
    }

    /// `CO2_Report_{brand}_{model}.txt`, with path separators replaced.
    pub fn suggested_file_name(&self) -> String {
        let clean = |s: &str| {
            s.trim()
                .chars()
                .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
                .collect::<String>()
        };
        format!(
            "CO2_Report_{}_{}.txt",
            clean(&self.identity.brand),
            clean(&self.identity.model)
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}
